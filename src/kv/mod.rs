//! Key-value store boundary for durable state
//!
//! The engine never talks to a concrete database: registry and assignment
//! state round-trip through this trait, so a browser-local store, Redis, or
//! a SQL table can sit behind it unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use sorteo::kv::{KvStore, MemoryKvStore};
//!
//! # async fn example() -> sorteo::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! store.set("key", b"value".to_vec()).await?;
//! let value = store.get("key").await?;
//! assert_eq!(value, Some(b"value".to_vec()));
//!
//! store.delete("key").await?;
//! assert!(!store.exists("key").await?);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryKvStore;

use crate::Result;
use std::future::Future;

/// Durable key-value store.
///
/// Implementations own durability and atomicity of single-key writes; the
/// engine serializes whole state snapshots per key, so no cross-key
/// transaction is required.
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Set a value for a key.
    ///
    /// Overwrites any existing value.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Shared handles delegate, so one backing store can outlive an engine
/// restart (`Arc<MemoryKvStore>` behaves like a durable store in tests).
impl<S: KvStore> KvStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_kv_set_get() {
        let store = MemoryKvStore::new();

        store.set("key1", b"value1".to_vec()).await.unwrap();
        let value = store.get("key1").await.unwrap();

        assert_eq!(value, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_kv_get_nonexistent() {
        let store = MemoryKvStore::new();

        let value = store.get("nonexistent").await.unwrap();

        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_memory_kv_overwrite() {
        let store = MemoryKvStore::new();

        store.set("key", b"value1".to_vec()).await.unwrap();
        store.set("key", b"value2".to_vec()).await.unwrap();
        let value = store.get("key").await.unwrap();

        assert_eq!(value, Some(b"value2".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_kv_delete() {
        let store = MemoryKvStore::new();

        store.set("key", b"value".to_vec()).await.unwrap();
        store.delete("key").await.unwrap();

        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_kv_delete_nonexistent() {
        let store = MemoryKvStore::new();

        // Should not error
        store.delete("nonexistent").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_kv_exists() {
        let store = MemoryKvStore::new();

        assert!(!store.exists("key").await.unwrap());

        store.set("key", b"value".to_vec()).await.unwrap();
        assert!(store.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_kv_concurrent_access() {
        use std::sync::Arc;

        let store = Arc::new(MemoryKvStore::new());
        let mut handles = vec![];

        for i in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let key = format!("key{i}");
                let value = format!("value{i}").into_bytes();
                store.set(&key, value).await.unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..100 {
            let key = format!("key{i}");
            let expected = format!("value{i}").into_bytes();
            assert_eq!(store.get(&key).await.unwrap(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_memory_kv_len_and_clear() {
        let store = MemoryKvStore::new();

        assert!(store.is_empty());
        store.set("key1", b"value1".to_vec()).await.unwrap();
        store.set("key2", b"value2".to_vec()).await.unwrap();
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get("key1").await.unwrap(), None);
    }
}
