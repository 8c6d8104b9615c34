//! Persisted key-value store adapter.
//!
//! Durable local storage shared by the cart and session managers. Each
//! manager owns a disjoint set of keys (see [`crate::models::session::keys`])
//! and never touches the other's.
//!
//! Reads fail open: a missing or unreadable value is reported as absent.
//! Writes return a [`StoreError`] so callers can log it.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur when writing to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the stored map failed.
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String-keyed, string-valued durable storage.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value. Absent and unreadable values are both `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be made durable.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion could not be made durable.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
