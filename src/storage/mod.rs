mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

use crate::Result;

/// Global key holding the raw session token
pub const TOKEN_KEY: &str = "token";

/// Carts are stored one key per user, namespaced by their email
pub fn cart_key(email: &str) -> String {
    format!("cart_{}", email)
}

/// Synchronous string key-value storage that survives restarts, the same
/// contract as browser local storage.
///
/// Every call is fallible so that a full or unavailable medium surfaces as
/// a recoverable `StorageError` to the stores instead of a panic
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
