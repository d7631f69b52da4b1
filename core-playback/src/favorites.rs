//! Favorite songs, persisted as a JSON array of ids under `favorites`.

use bridge_traits::KeyValueStore;
use core_runtime::events::FavoriteAction;
use tracing::warn;

pub const FAVORITES_KEY: &str = "favorites";

/// Insertion-ordered set of song ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    ids: Vec<String>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ids, dropping duplicates after the first occurrence.
    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        let mut favorites = Self::new();
        for id in ids {
            if !favorites.contains(&id) {
                favorites.ids.push(id);
            }
        }
        favorites
    }

    pub fn contains(&self, song_id: &str) -> bool {
        self.ids.iter().any(|id| id == song_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add when absent, remove when present.
    pub fn toggle(&mut self, song_id: &str) -> FavoriteAction {
        if let Some(index) = self.ids.iter().position(|id| id == song_id) {
            self.ids.remove(index);
            FavoriteAction::Removed
        } else {
            self.ids.push(song_id.to_string());
            FavoriteAction::Added
        }
    }

    /// Load from the store. Missing or unreadable data yields an empty set.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        let json = match store.get(FAVORITES_KEY).await {
            Ok(Some(json)) => json,
            Ok(None) => return Self::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read favorites");
                return Self::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&json) {
            Ok(ids) => Self::from_ids(ids),
            Err(e) => {
                warn!(error = %e, "Stored favorites are not a JSON id list, ignoring");
                Self::new()
            }
        }
    }

    /// Best-effort write. Returns whether it succeeded.
    pub async fn save(&self, store: &dyn KeyValueStore) -> bool {
        let json = match serde_json::to_string(&self.ids) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode favorites");
                return false;
            }
        };

        match store.set(FAVORITES_KEY, &json).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist favorites");
                false
            }
        }
    }
}
