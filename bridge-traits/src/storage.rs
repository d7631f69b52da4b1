//! Key-value persistence abstraction.
//!
//! A single string-keyed store backs the lyrics cache, favorites, and the
//! player settings blob. Hosts map it onto their native preference storage:
//! - iOS: UserDefaults / file-backed JSON
//! - Android: AsyncStorage / DataStore
//! - Desktop: SQLite (`bridge-desktop::SqliteKeyValueStore`)

use async_trait::async_trait;

use crate::error::Result;

/// Persistent string key-value store.
///
/// Values are opaque strings; callers serialise JSON themselves. Every
/// operation is asynchronous because mobile stores hop threads.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.set("player_settings", r#"{"streamQuality":"320kbps"}"#).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a single key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys in one round trip.
    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// List every key currently stored.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// List keys that start with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .list_keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        map: Mutex<BTreeMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.map.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.map
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.map.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.map.lock().unwrap().keys().cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_default_multi_remove() {
        let store = MapStore::default();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.set("c", "3").await.unwrap();

        store
            .multi_remove(&["a".to_string(), "c".to_string(), "missing".to_string()])
            .await
            .unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = MapStore::default();
        store.set("lyrics_cache_1", "{}").await.unwrap();
        store.set("lyrics_cache_2", "{}").await.unwrap();
        store.set("favorites", "[]").await.unwrap();

        let keys = store.keys_with_prefix("lyrics_cache_").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with("lyrics_cache_")));
    }
}
