use crate::error::Result;
use crate::model::TableSet;

/// Abstract interface for persisting the table set.
///
/// This trait handles the "how" of storage (JSON file vs memory), while
/// `DocumentStore` handles the "what" (statement emulation, seeding, the
/// read-only simulation flag).
pub trait StorageBackend {
    /// Load the full table set.
    /// Returns Ok(None) when nothing has been persisted yet.
    /// Returns Err when stored data exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<TableSet>>;

    /// Replace the persisted table set with `tables`, in full.
    fn save(&self, tables: &TableSet) -> Result<()>;

    /// Human-readable location, used in log messages.
    fn location(&self) -> String;
}
