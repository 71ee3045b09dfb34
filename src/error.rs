//! Error types for docstore
//!
//! Provides a unified error type for all storage operations.

use thiserror::Error;

/// Result type alias using DocStoreError
pub type Result<T> = std::result::Result<T, DocStoreError>;

/// Unified error type for docstore operations
#[derive(Debug, Error)]
pub enum DocStoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Write attempted on a handle opened without write permission
    #[error("Cannot write to the database. Access mode is \"{mode}\"")]
    Mode { mode: String },

    #[error("Storage handle is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Catalog Errors
    // -------------------------------------------------------------------------
    #[error("Catalog overflow: {0}")]
    CatalogOverflow(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    /// Bytes on disk do not parse as the expected header/fragment/line layout
    #[error("Format error: {0}")]
    Format(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Table mismatch: storage holds '{expected}', write names '{found}'")]
    TableMismatch { expected: String, found: String },

    // -------------------------------------------------------------------------
    // Capability / Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}
