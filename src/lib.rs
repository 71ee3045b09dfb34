//! # docstore
//!
//! File storage for a lightweight embedded JSON document store:
//! - Fixed 500-byte catalog header naming the tables in a file
//! - Frame backend: one table per file, append-only brace-stripped fragments
//! - Tagged-line backend: many tables per file, one `{"T", "V"}` line per write
//! - Snapshots and compaction to bound append-log growth
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Table / Query layer (external)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Storage: read / write / close / snapshot
//!          ┌────────────┼──────────────┬──────────────┐
//!          ▼            ▼              ▼              ▼
//!   ┌────────────┐ ┌────────────┐ ┌──────────┐ ┌──────────┐
//!   │   Frame    │ │ TaggedLine │ │   JSON   │ │  Memory  │
//!   │ (1 table)  │ │ (n tables) │ │ (rewrite)│ │          │
//!   └─────┬──────┘ └─────┬──────┘ └────┬─────┘ └──────────┘
//!         │              │             │
//!         ▼              │             │
//!   ┌────────────┐       │             │
//!   │  Catalog   │       │             │
//!   │  Header    │       ▼             ▼
//!   └────────────┘   ┌──────────────────────┐
//!                    │  Snapshot / Compact  │
//!                    └──────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod catalog;
pub mod storage;
pub mod snapshot;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DocStoreError, Result};
pub use config::{open_storage, AccessMode, Backend, StorageConfig};
pub use catalog::Catalog;
pub use storage::{
    DatabaseState, Document, FrameStorage, JsonStorage, LineStorage, MemoryStorage, Storage,
    Table,
};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of docstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
