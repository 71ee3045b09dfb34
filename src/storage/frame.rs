//! Frame Storage
//!
//! One table per file: a catalog header followed by appended fragments.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────┬──────────────┬──────────────┬─────
//! │ Catalog header (500)     │ fragment_1 , │ fragment_2 , │ ...
//! └──────────────────────────┴──────────────┴──────────────┴─────
//! ```
//!
//! A fragment is a JSON object of `{doc id: document}` with its outer
//! braces removed. Joined together and wrapped in braces again, the
//! fragments form one object; duplicate doc ids resolve to the last one.

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::catalog::{self, Catalog, CATALOG_VERSION, HEADER_SIZE};
use crate::config::{AccessMode, StorageConfig};
use crate::error::{DocStoreError, Result};
use crate::snapshot;

use super::file::{prepare_parent, LogFile};
use super::{format_error, to_json_bytes, DatabaseState, Storage, Table};

/// Byte appended after every fragment
pub const FRAGMENT_SEPARATOR: u8 = b',';

/// Single-table append-only storage
#[derive(Debug)]
pub struct FrameStorage {
    log: LogFile,
    table: String,
    json_indent: Option<usize>,
    archive_on_compact: bool,
}

impl FrameStorage {
    /// Open or create the frame file for `table`
    ///
    /// A new file gets a header cataloging `[table]`. For an existing file
    /// the header is checked but not enforced. A non-empty file shorter
    /// than the header is a `Format` error.
    pub fn open(config: &StorageConfig, table: &str) -> Result<Self> {
        let path = config.path.as_path();
        let catalog = Catalog::with_tables(CATALOG_VERSION, &[table])?;

        if config.access_mode.is_writable() && !path.exists() {
            prepare_parent(path, config.create_dirs)?;
            let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
            catalog::write_to(&mut file, &catalog)?;
            file.sync_all()?;
            debug!(path = %path.display(), table, "created frame file");
        }

        let mut log = LogFile::open(path, config.access_mode)?;
        let len = log.len()?;

        if len == 0 && config.access_mode.is_writable() {
            log.append_durable(&catalog.encode())?;
            debug!(path = %path.display(), table, "wrote header into empty frame file");
        } else if len >= HEADER_SIZE as u64 {
            let mut block = [0u8; HEADER_SIZE];
            log.read_exact_at(0, &mut block)?;
            match Catalog::decode(&block) {
                Ok(stored) if stored.contains(table) => {}
                Ok(stored) => warn!(
                    path = %path.display(),
                    table,
                    stored = ?stored.names().collect::<Vec<_>>(),
                    "frame header does not catalog this table"
                ),
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable frame header"),
            }
        } else if len > 0 {
            // Appends would land inside the header region and vanish from reads
            return Err(DocStoreError::Format(format!(
                "frame file is shorter than its header ({} of {} bytes)",
                len, HEADER_SIZE
            )));
        }

        debug!(path = %path.display(), table, mode = %config.access_mode, "opened frame storage");

        Ok(Self {
            log,
            table: table.to_string(),
            json_indent: config.json_indent,
            archive_on_compact: config.archive_on_compact,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config, read/write access
    pub fn open_path(path: &Path, table: &str) -> Result<Self> {
        let config = StorageConfig::builder().path(path).frame(table).build();
        Self::open(&config, table)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn access_mode(&self) -> AccessMode {
        self.log.mode()
    }

    pub fn is_closed(&self) -> bool {
        self.log.is_closed()
    }

    /// Append one fragment holding `docs`
    ///
    /// An empty map writes nothing: an empty fragment would leave two
    /// separators in a row and break every later read.
    pub fn write_table(&mut self, docs: &Table) -> Result<()> {
        self.log.ensure_writable()?;
        if docs.is_empty() {
            return Ok(());
        }

        let fragment = encode_fragment(docs)?;
        self.log.append_durable(&fragment)?;
        trace!(table = %self.table, docs = docs.len(), bytes = fragment.len(), "appended fragment");
        Ok(())
    }

    /// Read a snapshot written by [`Storage::snapshot`]
    ///
    /// The table name comes from the snapshot's own header.
    pub fn load_snapshot(path: &Path) -> Result<Option<DatabaseState>> {
        let mut file = File::open(path)?;
        let header = catalog::read_from(&mut file)?;

        let mut body = Vec::new();
        file.read_to_end(&mut body)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let state: DatabaseState =
            serde_json::from_slice(&body).map_err(|e| format_error("frame snapshot", e))?;

        for table in state.keys() {
            if !header.contains(table) {
                warn!(path = %path.display(), table = %table, "snapshot table missing from header");
            }
        }
        Ok(Some(state))
    }

    /// Rewrite the log as header + one fragment with the current state
    ///
    /// The rewritten file stays appendable. With `archive_on_compact` the
    /// old log is kept as `{path}.bak`.
    pub fn compact_in_place(&mut self) -> Result<()> {
        self.log.ensure_writable()?;

        let docs = self
            .read()?
            .and_then(|mut state| state.remove(&self.table))
            .unwrap_or_default();

        let mut contents = Catalog::with_tables(CATALOG_VERSION, &[self.table.as_str()])?
            .encode()
            .to_vec();
        if !docs.is_empty() {
            contents.extend_from_slice(&encode_fragment(&docs)?);
        }

        self.log.close()?;
        let replaced = snapshot::replace_log(self.log.path(), &contents, self.archive_on_compact);
        self.log.reopen()?;
        replaced?;

        debug!(table = %self.table, docs = docs.len(), bytes = contents.len(), "compacted frame log");
        Ok(())
    }

    /// Reject deltas that name any table but ours
    fn check_delta(&self, delta: &DatabaseState) -> Result<()> {
        match delta.keys().find(|table| **table != self.table) {
            Some(other) => Err(DocStoreError::TableMismatch {
                expected: self.table.clone(),
                found: other.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Storage for FrameStorage {
    fn read(&mut self) -> Result<Option<DatabaseState>> {
        if self.log.len()? <= HEADER_SIZE as u64 {
            return Ok(None);
        }

        let body = self.log.read_from(HEADER_SIZE as u64)?;
        let docs = decode_fragments(&body)?;

        let mut state = DatabaseState::new();
        state.insert(self.table.clone(), docs);
        Ok(Some(state))
    }

    fn write(&mut self, delta: &DatabaseState) -> Result<()> {
        self.log.ensure_writable()?;
        self.check_delta(delta)?;

        match delta.get(&self.table) {
            Some(docs) => self.write_table(docs),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.log.close()
    }

    /// Write header + `{"<table>": {...}}` to `{path}.0`
    fn snapshot(&mut self, full: &DatabaseState) -> Result<()> {
        self.check_delta(full)?;

        let empty = Table::new();
        let docs = full.get(&self.table).unwrap_or(&empty);

        let mut object = DatabaseState::new();
        object.insert(self.table.clone(), docs.clone());

        let header = Catalog::with_tables(CATALOG_VERSION, &[self.table.as_str()])?.encode();
        let body = to_json_bytes(&object, self.json_indent)?;

        let target = snapshot::snapshot_path(self.log.path());
        snapshot::write_snapshot_file(&target, &[&header[..], body.as_slice()])?;
        debug!(path = %target.display(), table = %self.table, docs = docs.len(), "wrote frame snapshot");
        Ok(())
    }

    fn supports_snapshot(&self) -> bool {
        true
    }

    fn path(&self) -> Option<&Path> {
        Some(self.log.path())
    }
}

// =============================================================================
// Fragment Codec
// =============================================================================

/// Serialize `docs` without outer braces, followed by the separator
fn encode_fragment(docs: &Table) -> Result<Vec<u8>> {
    let object = to_json_bytes(docs, None)?;
    // Compact output of a map is always `{...}`
    let mut fragment = object[1..object.len() - 1].to_vec();
    fragment.push(FRAGMENT_SEPARATOR);
    Ok(fragment)
}

/// Parse the concatenated fragments that follow the header
fn decode_fragments(body: &[u8]) -> Result<Table> {
    let body = match body.split_last() {
        Some((&FRAGMENT_SEPARATOR, rest)) => rest,
        _ => {
            return Err(DocStoreError::Format(
                "frame body does not end with a fragment separator".to_string(),
            ))
        }
    };

    let mut object = Vec::with_capacity(body.len() + 2);
    object.push(b'{');
    object.extend_from_slice(body);
    object.push(b'}');

    serde_json::from_slice(&object).map_err(|e| format_error("frame fragments", e))
}
