//! Persistent key-value storage for Tourney.
//!
//! The client keeps a handful of strings across restarts: the device
//! keys, the registered device token, the current session, the player's
//! name and linking code, and one resume pointer per joined tournament.
//! This crate puts all of that behind one narrow trait so the rest of the
//! stack never touches raw string keys.
//!
//! - [`KeyValueStore`]: the trait (get / set / remove strings)
//! - [`MemoryStore`]: in-process, for tests and ephemeral clients
//! - [`JsonFileStore`]: one JSON object on disk, rewritten on every change
//! - [`StoreKey`]: the documented schema of every key the client writes

mod error;
mod file;
mod key;
mod memory;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use key::StoreKey;
pub use memory::MemoryStore;

/// Durable string storage.
///
/// Implementations must be safe to share between tasks; the session layer
/// and the workflow both hold the same store.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the stored value, or `None` if the key was never set.
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &StoreKey, value: &str) -> Result<(), StoreError>;

    /// Deletes the key. Removing a missing key is not an error.
    fn remove(&self, key: &StoreKey) -> Result<(), StoreError>;

    /// Like [`get`](Self::get), but treats an empty string as missing.
    ///
    /// Older clients wrote `""` to mean "unset".
    fn get_non_empty(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.get(key)?.filter(|v| !v.is_empty()))
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
