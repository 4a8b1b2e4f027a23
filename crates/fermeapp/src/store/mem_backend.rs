use super::backend::StorageBackend;
use crate::error::{FermeError, Result};
use crate::model::TableSet;
use std::cell::{Cell, RefCell};

/// In-memory storage backend for testing.
///
/// Keeps the serialized JSON text rather than the tables themselves, so tests can
/// compare "file" contents byte for byte the same way they would on disk.
/// Uses `RefCell` for interior mutability since the store is single-threaded.
#[derive(Default)]
pub struct MemBackend {
    raw: RefCell<Option<String>>,
    simulate_write_error: Cell<bool>,
    saves: Cell<usize>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from pre-existing "file" contents, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.raw.borrow_mut() = Some(raw.into());
        backend
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Current persisted text, if any.
    pub fn raw(&self) -> Option<String> {
        self.raw.borrow().clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl StorageBackend for MemBackend {
    fn load(&self) -> Result<Option<TableSet>> {
        match self.raw.borrow().as_deref() {
            None => Ok(None),
            Some(text) => serde_json::from_str(text)
                .map(Some)
                .map_err(FermeError::Serialization),
        }
    }

    fn save(&self, tables: &TableSet) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(FermeError::Store("Simulated write error".to_string()));
        }
        let text = serde_json::to_string_pretty(tables).map_err(FermeError::Serialization)?;
        *self.raw.borrow_mut() = Some(text);
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "memory://db.json".to_string()
    }
}
