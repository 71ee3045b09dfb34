//! Memory Storage
//!
//! Keeps the state in memory only; useful for tests and throwaway
//! databases.

use crate::error::Result;

use super::{fold_into, DatabaseState, Storage};

/// Non-persistent storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    memory: Option<DatabaseState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self) -> Result<Option<DatabaseState>> {
        Ok(self.memory.clone())
    }

    fn write(&mut self, delta: &DatabaseState) -> Result<()> {
        let state = self.memory.get_or_insert_with(DatabaseState::new);
        for (table, docs) in delta {
            fold_into(state, table, docs.clone());
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
