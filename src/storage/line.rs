//! Tagged-Line Storage
//!
//! Any number of tables in one file, one self-describing JSON line per
//! record:
//!
//! ```text
//! {"T":"users","V":{"1":{"name":"ada"}}}
//! {"T":"posts","V":{"7":{"title":"hi"}}}
//! {"T":"users","V":{"1":{"name":"ada lovelace"}}}
//! ```
//!
//! No header is needed and tables come into existence on first write.
//! Reads scan the whole file and fold lines oldest first.

use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{AccessMode, StorageConfig};
use crate::error::{DocStoreError, Result};
use crate::snapshot;

use super::file::{touch, LogFile};
use super::{fold_into, format_error, to_json_bytes, DatabaseState, Storage, Table};

/// Byte terminating every tagged line
pub const LINE_TERMINATOR: u8 = b'\n';

/// One record: the owning table and the documents it sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedLine<'a> {
    #[serde(rename = "T", borrow)]
    pub table: Cow<'a, str>,

    #[serde(rename = "V")]
    pub docs: Cow<'a, Table>,
}

impl<'a> TaggedLine<'a> {
    pub fn new(table: &'a str, docs: &'a Table) -> Self {
        Self {
            table: Cow::Borrowed(table),
            docs: Cow::Borrowed(docs),
        }
    }

    /// Encode as one compact JSON line including the terminator
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut line = to_json_bytes(self, None)?;
        line.push(LINE_TERMINATOR);
        Ok(line)
    }

    /// Parse one line (terminator already removed)
    pub fn decode(line: &'a str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| format_error("tagged line", e))
    }
}

/// Multi-table append-only storage
#[derive(Debug)]
pub struct LineStorage {
    log: LogFile,
    tables: Vec<String>,
    archive_on_compact: bool,
}

impl LineStorage {
    /// Open or create the line file
    ///
    /// `tables` are reported as (possibly empty) tables by every read of a
    /// non-empty file.
    pub fn open<S: AsRef<str>>(config: &StorageConfig, tables: &[S]) -> Result<Self> {
        let path = config.path.as_path();
        if config.access_mode.is_writable() {
            touch(path, config.create_dirs)?;
        }

        let log = LogFile::open(path, config.access_mode)?;
        debug!(path = %path.display(), mode = %config.access_mode, "opened line storage");

        Ok(Self {
            log,
            tables: tables.iter().map(|t| t.as_ref().to_string()).collect(),
            archive_on_compact: config.archive_on_compact,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config, read/write access, no initial tables
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = StorageConfig::builder().path(path).build();
        Self::open::<&str>(&config, &[])
    }

    /// Tables named at open time
    pub fn initial_tables(&self) -> &[String] {
        &self.tables
    }

    pub fn access_mode(&self) -> AccessMode {
        self.log.mode()
    }

    pub fn is_closed(&self) -> bool {
        self.log.is_closed()
    }

    /// Append one line for `table`
    pub fn write_table(&mut self, table: &str, docs: &Table) -> Result<()> {
        self.log.ensure_writable()?;
        let line = TaggedLine::new(table, docs).encode()?;
        self.log.append_durable(&line)?;
        trace!(table, docs = docs.len(), bytes = line.len(), "appended tagged line");
        Ok(())
    }

    /// Rewrite the log with one line per table
    ///
    /// With `archive_on_compact` the old log is kept as `{path}.bak`.
    pub fn compact_in_place(&mut self) -> Result<()> {
        self.log.ensure_writable()?;

        let state = self.read()?.unwrap_or_default();
        let contents = encode_lines(&state)?;

        self.log.close()?;
        let replaced = snapshot::replace_log(self.log.path(), &contents, self.archive_on_compact);
        self.log.reopen()?;
        replaced?;

        debug!(tables = state.len(), bytes = contents.len(), "compacted line log");
        Ok(())
    }
}

impl Storage for LineStorage {
    fn read(&mut self) -> Result<Option<DatabaseState>> {
        if self.log.len()? == 0 {
            return Ok(None);
        }

        let bytes = self.log.read_from(0)?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|e| DocStoreError::Format(format!("line file is not UTF-8: {}", e)))?;

        let mut state = DatabaseState::new();
        for table in &self.tables {
            state.entry(table.clone()).or_default();
        }

        for (index, raw) in content.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let line: TaggedLine = serde_json::from_str(raw)
                .map_err(|e| format_error(format!("tagged line {}", index + 1), e))?;
            fold_into(&mut state, &line.table, line.docs.into_owned());
        }

        Ok(Some(state))
    }

    /// Append one line per table named in `delta`
    ///
    /// A table with no documents still gets a line, which is how a table
    /// is created. All lines are synced together.
    fn write(&mut self, delta: &DatabaseState) -> Result<()> {
        self.log.ensure_writable()?;
        if delta.is_empty() {
            return Ok(());
        }

        let lines = encode_lines(delta)?;
        self.log.append_durable(&lines)?;
        trace!(tables = delta.len(), bytes = lines.len(), "appended tagged lines");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log.close()
    }

    /// Write one line per table to `{path}.0`; the result is a valid line log
    fn snapshot(&mut self, full: &DatabaseState) -> Result<()> {
        let contents = encode_lines(full)?;
        let target = snapshot::snapshot_path(self.log.path());
        snapshot::write_snapshot_file(&target, &[contents.as_slice()])?;
        debug!(path = %target.display(), tables = full.len(), "wrote line snapshot");
        Ok(())
    }

    fn supports_snapshot(&self) -> bool {
        true
    }

    fn path(&self) -> Option<&Path> {
        Some(self.log.path())
    }
}

fn encode_lines(state: &DatabaseState) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for (table, docs) in state {
        buf.extend_from_slice(&TaggedLine::new(table, docs).encode()?);
    }
    Ok(buf)
}
