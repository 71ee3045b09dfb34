//! Catalog Header Module
//!
//! Fixed-size directory of table names stored at the start of a file.
//!
//! ## Header Layout (500 bytes)
//! ```text
//! ┌─────────────┬──────────────────────┬──────────────────┬──────────────┐
//! │ Version (1) │ Name lengths (20 x 1)│ Name bytes (S)   │ Zero padding │
//! └─────────────┴──────────────────────┴──────────────────┴──────────────┘
//!   byte 0        bytes 1..21            bytes 21..21+S     ..500
//! ```
//!
//! - A zero length terminates the name list; later length bytes are ignored
//! - Names are UTF-8, at most 20 bytes each, at most 20 names
//! - `21 + S <= 500` always holds; the data region never has to move
//!   when a table is added

mod codec;

pub use codec::{decode, encode, read_from, write_to};

use crate::error::{DocStoreError, Result};

// =============================================================================
// Layout Constants
// =============================================================================

/// Total size of the header block
pub const HEADER_SIZE: usize = 500;

/// Maximum number of cataloged tables
pub const MAX_TABLES: usize = 20;

/// Maximum table name length in bytes
pub const MAX_NAME_LEN: usize = 20;

/// Format version written by this crate
pub const CATALOG_VERSION: u8 = 1;

/// Offset of the first name byte: version (1) + length list (20)
pub(crate) const NAMES_OFFSET: usize = 1 + MAX_TABLES;

// =============================================================================
// Static-Capacity Directory
// =============================================================================

/// One directory slot: a length and up to 20 name bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TableSlot {
    len: u8,
    bytes: [u8; MAX_NAME_LEN],
}

impl TableSlot {
    fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(DocStoreError::InvalidTableName(
                "empty names cannot be cataloged".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(DocStoreError::CatalogOverflow(format!(
                "table name '{}' is {} bytes, limit is {}",
                name,
                name.len(),
                MAX_NAME_LEN
            )));
        }

        let mut bytes = [0u8; MAX_NAME_LEN];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self {
            len: name.len() as u8,
            bytes,
        })
    }

    pub(crate) fn len(&self) -> u8 {
        self.len
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    fn as_str(&self) -> &str {
        // Slots are only built from &str, so the bytes are valid UTF-8
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

/// The table-name directory held in a catalog header
///
/// Capacity is fixed at [`MAX_TABLES`] slots; `push` fails instead of
/// growing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    version: u8,
    count: usize,
    slots: [TableSlot; MAX_TABLES],
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(version: u8) -> Self {
        Self {
            version,
            count: 0,
            slots: [TableSlot::default(); MAX_TABLES],
        }
    }

    /// Create a catalog holding `names` in order
    pub fn with_tables<S: AsRef<str>>(version: u8, names: &[S]) -> Result<Self> {
        if names.len() > MAX_TABLES {
            return Err(DocStoreError::CatalogOverflow(format!(
                "{} tables given, limit is {}",
                names.len(),
                MAX_TABLES
            )));
        }

        let mut catalog = Self::new(version);
        for name in names {
            catalog.push(name.as_ref())?;
        }
        Ok(catalog)
    }

    /// Append a table name
    pub fn push(&mut self, name: &str) -> Result<()> {
        if self.count == MAX_TABLES {
            return Err(DocStoreError::CatalogOverflow(format!(
                "catalog already holds {} tables",
                MAX_TABLES
            )));
        }

        let slot = TableSlot::new(name)?;
        let encoded = self.encoded_len() + slot.len() as usize;
        if encoded > HEADER_SIZE {
            return Err(DocStoreError::CatalogOverflow(format!(
                "header would need {} bytes, limit is {}",
                encoded, HEADER_SIZE
            )));
        }

        self.slots[self.count] = slot;
        self.count += 1;
        Ok(())
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Table names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots[..self.count].iter().map(TableSlot::as_str)
    }

    /// Bytes used before padding: version, length list and names
    pub fn encoded_len(&self) -> usize {
        NAMES_OFFSET
            + self.slots[..self.count]
                .iter()
                .map(|s| s.len() as usize)
                .sum::<usize>()
    }

    pub(crate) fn slots(&self) -> &[TableSlot] {
        &self.slots[..self.count]
    }
}
