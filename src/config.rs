//! Configuration for docstore
//!
//! Selects a backend and the options it is opened with.

use std::fmt;
use std::path::PathBuf;

use crate::error::{DocStoreError, Result};
use crate::storage::{FrameStorage, JsonStorage, LineStorage, MemoryStorage, Storage};

/// Main configuration for opening a storage backend
#[derive(Debug, Clone)]
pub struct StorageConfig {
    // -------------------------------------------------------------------------
    // File Configuration
    // -------------------------------------------------------------------------
    /// Database file. Snapshots land next to it as `{path}.0`.
    pub path: PathBuf,

    /// Which on-disk layout to use
    pub backend: Backend,

    /// Whether the handle may be written to
    pub access_mode: AccessMode,

    /// Create missing parent directories when creating the file
    pub create_dirs: bool,

    // -------------------------------------------------------------------------
    // Serialization Configuration
    // -------------------------------------------------------------------------
    /// Pretty-print indent for full-object output (json backend, frame
    /// snapshots). Appended fragments and tagged lines are always compact.
    pub json_indent: Option<usize>,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Keep the pre-compaction log as `{path}.bak`
    pub archive_on_compact: bool,
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// One table per file: catalog header + appended fragments
    Frame { table: String },

    /// Any number of tables, one tagged JSON line per write
    Line { tables: Vec<String> },

    /// Whole state rewritten as one JSON object per write
    Json,

    /// Nothing persisted
    Memory,
}

/// How the backing file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `r`: reads only, writes fail with a mode error
    ReadOnly,

    /// `r+`: reads and appends, file created when missing
    ReadWrite,
}

impl AccessMode {
    pub fn is_writable(self) -> bool {
        matches!(self, AccessMode::ReadWrite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "r",
            AccessMode::ReadWrite => "r+",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessMode {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" => Ok(AccessMode::ReadOnly),
            "r+" | "a" | "a+" | "w+" => Ok(AccessMode::ReadWrite),
            other => Err(DocStoreError::Config(format!(
                "unsupported access mode '{}'",
                other
            ))),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./docstore.db"),
            backend: Backend::Line { tables: Vec::new() },
            access_mode: AccessMode::ReadWrite,
            create_dirs: false,
            json_indent: None,
            archive_on_compact: false,
        }
    }
}

impl StorageConfig {
    /// Create a new config builder
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::default()
    }

    /// Open the configured backend behind the storage contract
    pub fn open(&self) -> Result<Box<dyn Storage>> {
        open_storage(self)
    }
}

/// Open the backend named by `config`
pub fn open_storage(config: &StorageConfig) -> Result<Box<dyn Storage>> {
    let storage: Box<dyn Storage> = match &config.backend {
        Backend::Frame { table } => Box::new(FrameStorage::open(config, table)?),
        Backend::Line { tables } => Box::new(LineStorage::open(config, tables)?),
        Backend::Json => Box::new(JsonStorage::open(config)?),
        Backend::Memory => Box::new(MemoryStorage::new()),
    };
    Ok(storage)
}

/// Builder for StorageConfig
#[derive(Default)]
pub struct StorageConfigBuilder {
    config: StorageConfig,
}

impl StorageConfigBuilder {
    /// Set the database file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Use the single-table frame backend
    pub fn frame(mut self, table: impl Into<String>) -> Self {
        self.config.backend = Backend::Frame {
            table: table.into(),
        };
        self
    }

    /// Use the multi-table tagged-line backend
    pub fn line<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.backend = Backend::Line {
            tables: tables.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Set the backend directly
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the access mode
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.config.access_mode = mode;
        self
    }

    /// Create missing parent directories on first open
    pub fn create_dirs(mut self, create: bool) -> Self {
        self.config.create_dirs = create;
        self
    }

    /// Pretty-print full-object output with this indent
    pub fn json_indent(mut self, indent: usize) -> Self {
        self.config.json_indent = Some(indent);
        self
    }

    /// Keep the old log as `{path}.bak` after compaction
    pub fn archive_on_compact(mut self, archive: bool) -> Self {
        self.config.archive_on_compact = archive;
        self
    }

    pub fn build(self) -> StorageConfig {
        self.config
    }
}
