//! Storage Module
//!
//! Backends that persist a Database State (`table -> doc id -> document`)
//! and rebuild it from disk.
//!
//! ## Backends
//! - [`FrameStorage`]: one table per file, catalog header + appended
//!   brace-stripped fragments
//! - [`LineStorage`]: any number of tables, one tagged JSON line per record
//! - [`JsonStorage`]: the whole state as one JSON object, rewritten per write
//! - [`MemoryStorage`]: nothing persisted
//!
//! ## Read Semantics
//! Every `read` is a full scan that folds records in file order. A later
//! record for the same `(table, doc id)` replaces an earlier one. There is
//! no delete marker.

mod file;
mod frame;
mod json;
mod line;
mod memory;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{DocStoreError, Result};

pub use frame::{FrameStorage, FRAGMENT_SEPARATOR};
pub use json::JsonStorage;
pub use line::{LineStorage, TaggedLine, LINE_TERMINATOR};
pub use memory::MemoryStorage;

// =============================================================================
// Data Model
// =============================================================================

/// A stored document
pub type Document = serde_json::Value;

/// Documents of one table keyed by document id
pub type Table = serde_json::Map<String, Document>;

/// Every table keyed by name
pub type DatabaseState = BTreeMap<String, Table>;

// =============================================================================
// Storage Contract
// =============================================================================

/// Contract between a backend and the table/query layer
///
/// `read` returns `None` when nothing has been written yet, which is
/// distinct from `Some` of an empty map. `write` receives a delta: append
/// backends add or overwrite the given entries, they never drop entries
/// that the delta leaves out.
pub trait Storage {
    /// Rebuild the full state from storage
    fn read(&mut self) -> Result<Option<DatabaseState>>;

    /// Persist additional or overwriting entries
    fn write(&mut self, delta: &DatabaseState) -> Result<()>;

    /// Release the underlying file. Safe to call more than once.
    fn close(&mut self) -> Result<()>;

    /// Write `full` in one shot to `{path}.0`
    ///
    /// Line and json snapshots are valid files of their own backend and
    /// read back through [`Storage::read`]. A frame snapshot holds one full
    /// object instead of appendable fragments, so it is read with
    /// [`FrameStorage::load_snapshot`].
    fn snapshot(&mut self, _full: &DatabaseState) -> Result<()> {
        Err(DocStoreError::Unsupported("snapshot"))
    }

    fn supports_snapshot(&self) -> bool {
        false
    }

    /// Backing file, if any
    fn path(&self) -> Option<&Path> {
        None
    }
}

// =============================================================================
// Fold
// =============================================================================

/// Merge `docs` into `table` of `state`; entries in `docs` win
///
/// A table seen for the first time starts out empty.
pub fn fold_into(state: &mut DatabaseState, table: &str, docs: Table) {
    let target = state.entry(table.to_string()).or_default();
    for (doc_id, document) in docs {
        target.insert(doc_id, document);
    }
}

/// Fold records in order, oldest first
pub fn fold<I>(records: I) -> DatabaseState
where
    I: IntoIterator<Item = (String, Table)>,
{
    let mut state = DatabaseState::new();
    for (table, docs) in records {
        fold_into(&mut state, &table, docs);
    }
    state
}

// =============================================================================
// Serialization Helpers
// =============================================================================

/// Serialize `value`, pretty-printed when `indent` is set
pub(crate) fn to_json_bytes<T>(value: &T, indent: Option<usize>) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    match indent {
        Some(width) => {
            let indent = vec![b' '; width];
            let formatter = PrettyFormatter::with_indent(&indent);
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value
                .serialize(&mut serializer)
                .map_err(|e| DocStoreError::Serialization(e.to_string()))?;
        }
        None => {
            serde_json::to_writer(&mut buf, value)
                .map_err(|e| DocStoreError::Serialization(e.to_string()))?;
        }
    }
    Ok(buf)
}

pub(crate) fn format_error(context: impl std::fmt::Display, err: serde_json::Error) -> DocStoreError {
    DocStoreError::Format(format!("{}: {}", context, err))
}
