//! Catalog header codec
//!
//! Encoding and decoding of the 500-byte header block.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DocStoreError, Result};

use super::{Catalog, HEADER_SIZE, MAX_NAME_LEN, MAX_TABLES, NAMES_OFFSET};

// =============================================================================
// Encoding
// =============================================================================

/// Encode `version` and `names` into a header block
///
/// Fails with `CatalogOverflow` when more than 20 names are given, a name
/// is longer than 20 bytes, or the names do not fit in 500 bytes.
pub fn encode<S: AsRef<str>>(version: u8, names: &[S]) -> Result<[u8; HEADER_SIZE]> {
    Ok(Catalog::with_tables(version, names)?.encode())
}

impl Catalog {
    /// Encode this catalog into a header block
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);

        buf.put_u8(self.version());

        // Unused slots have length 0, which terminates the list
        let mut lengths = [0u8; MAX_TABLES];
        for (len, slot) in lengths.iter_mut().zip(self.slots()) {
            *len = slot.len();
        }
        buf.put_slice(&lengths);

        for slot in self.slots() {
            buf.put_slice(slot.as_bytes());
        }

        buf.resize(HEADER_SIZE, 0);

        let mut block = [0u8; HEADER_SIZE];
        block.copy_from_slice(&buf);
        block
    }

    /// Decode a header block
    pub fn decode(block: &[u8]) -> Result<Self> {
        if block.len() < HEADER_SIZE {
            return Err(DocStoreError::Format(format!(
                "catalog header needs {} bytes, got {}",
                HEADER_SIZE,
                block.len()
            )));
        }

        let mut cursor = &block[..HEADER_SIZE];
        let version = cursor.get_u8();

        let mut lengths = [0u8; MAX_TABLES];
        cursor.copy_to_slice(&mut lengths);

        let mut catalog = Catalog::new(version);
        let mut offset = NAMES_OFFSET;

        for &len in lengths.iter().take_while(|&&len| len > 0) {
            let len = len as usize;
            if len > MAX_NAME_LEN {
                return Err(DocStoreError::Format(format!(
                    "catalog entry {} has length {}, limit is {}",
                    catalog.len(),
                    len,
                    MAX_NAME_LEN
                )));
            }
            if offset + len > HEADER_SIZE {
                return Err(DocStoreError::Format(
                    "catalog names run past the header".to_string(),
                ));
            }

            let name = std::str::from_utf8(&block[offset..offset + len]).map_err(|e| {
                DocStoreError::Format(format!(
                    "catalog entry {} is not UTF-8: {}",
                    catalog.len(),
                    e
                ))
            })?;
            catalog.push(name)?;
            offset += len;
        }

        Ok(catalog)
    }
}

/// Decode a header block into its version and ordered table names
pub fn decode(block: &[u8]) -> Result<(u8, Vec<String>)> {
    let catalog = Catalog::decode(block)?;
    let names = catalog.names().map(str::to_string).collect();
    Ok((catalog.version(), names))
}

// =============================================================================
// I/O Helpers
// =============================================================================

/// Read and decode the header with a single fixed-size read
pub fn read_from<R: Read>(reader: &mut R) -> Result<Catalog> {
    let mut block = [0u8; HEADER_SIZE];
    reader.read_exact(&mut block).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DocStoreError::Format("file is shorter than the catalog header".to_string())
        } else {
            DocStoreError::Io(e)
        }
    })?;
    Catalog::decode(&block)
}

/// Encode and write the header block
pub fn write_to<W: Write>(writer: &mut W, catalog: &Catalog) -> Result<()> {
    writer.write_all(&catalog.encode())?;
    Ok(())
}
