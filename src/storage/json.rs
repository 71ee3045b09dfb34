//! JSON Storage
//!
//! The whole Database State as a single JSON object. Every write reads
//! the current state, folds the delta in and replaces the file, so the
//! cost of a write grows with the database. The replacement goes through
//! the same staging file and rename as log compaction.

use std::path::Path;

use tracing::{debug, trace};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::snapshot;

use super::file::{touch, LogFile};
use super::{fold_into, format_error, to_json_bytes, DatabaseState, Storage};

/// Full-rewrite storage
#[derive(Debug)]
pub struct JsonStorage {
    log: LogFile,
    json_indent: Option<usize>,
}

impl JsonStorage {
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = config.path.as_path();
        if config.access_mode.is_writable() {
            touch(path, config.create_dirs)?;
        }

        let log = LogFile::open(path, config.access_mode)?;
        debug!(path = %path.display(), mode = %config.access_mode, "opened json storage");

        Ok(Self {
            log,
            json_indent: config.json_indent,
        })
    }

    /// Read a file in this layout without opening a storage
    pub fn load(path: &Path) -> Result<Option<DatabaseState>> {
        let bytes = std::fs::read(path)?;
        parse_state(&bytes)
    }
}

impl Storage for JsonStorage {
    fn read(&mut self) -> Result<Option<DatabaseState>> {
        if self.log.len()? == 0 {
            return Ok(None);
        }
        let bytes = self.log.read_from(0)?;
        parse_state(&bytes)
    }

    fn write(&mut self, delta: &DatabaseState) -> Result<()> {
        self.log.ensure_writable()?;

        let mut state = self.read()?.unwrap_or_default();
        for (table, docs) in delta {
            fold_into(&mut state, table, docs.clone());
        }

        let bytes = to_json_bytes(&state, self.json_indent)?;

        // Synced in a sibling file and renamed over the old one
        self.log.close()?;
        let replaced = snapshot::replace_log(self.log.path(), &bytes, false);
        self.log.reopen()?;
        replaced?;

        trace!(tables = state.len(), bytes = bytes.len(), "rewrote json file");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log.close()
    }

    fn snapshot(&mut self, full: &DatabaseState) -> Result<()> {
        let bytes = to_json_bytes(full, self.json_indent)?;
        let target = snapshot::snapshot_path(self.log.path());
        snapshot::write_snapshot_file(&target, &[bytes.as_slice()])?;
        debug!(path = %target.display(), tables = full.len(), "wrote json snapshot");
        Ok(())
    }

    fn supports_snapshot(&self) -> bool {
        true
    }

    fn path(&self) -> Option<&Path> {
        Some(self.log.path())
    }
}

fn parse_state(bytes: &[u8]) -> Result<Option<DatabaseState>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| format_error("json file", e))
}
