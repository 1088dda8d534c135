//! Key-value storage for encoded games.

mod dir;
mod memory;

pub use dir::{DirStore, StoreConfig};
pub use memory::MemoryStore;

use crate::error::StoreError;

/// Byte storage keyed by an opaque game identifier.
pub trait GameStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: GameStore + ?Sized> GameStore for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}
