//! Lyrics cache on top of the host key-value store.
//!
//! One entry per song under `lyrics_cache_<songId>`:
//!
//! ```json
//! {
//!   "lyrics": [{"time": 1.5, "text": "Hello"}],
//!   "isSynced": true,
//!   "songName": "Song",
//!   "artistName": "Artist",
//!   "cachedAt": 1700000000000
//! }
//! ```
//!
//! Background operations (`get`, `store`, `delete*`) absorb storage errors:
//! they are logged and reported as a miss or `false`. Explicit user actions
//! (export/import) return `Result`.

use bridge_traits::{Clock, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{LyricsError, Result};
use crate::parser::{parse_raw_lyrics, LyricsDocument, TimedLine};

pub const CACHE_KEY_PREFIX: &str = "lyrics_cache_";

/// Exported bundle: song id to entry.
pub type LyricsBundle = BTreeMap<String, CachedLyricsEntry>;

pub fn cache_key(song_id: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, song_id)
}

/// A stored line: timed object or bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CachedLine {
    Timed(TimedLine),
    Plain(String),
}

/// Stored lyrics payload. Older entries may hold the raw provider text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CachedLyrics {
    Lines(Vec<CachedLine>),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLyricsEntry {
    pub lyrics: CachedLyrics,
    pub is_synced: bool,
    #[serde(default)]
    pub song_name: String,
    #[serde(default)]
    pub artist_name: String,
    /// Unix milliseconds.
    #[serde(default)]
    pub cached_at: i64,
}

impl CachedLyricsEntry {
    pub fn new(
        document: &LyricsDocument,
        song_name: impl Into<String>,
        artist_name: impl Into<String>,
        cached_at: i64,
    ) -> Self {
        let lines = match document {
            LyricsDocument::Synced(lines) => lines.iter().cloned().map(CachedLine::Timed).collect(),
            LyricsDocument::Unsynced(lines) => lines.iter().cloned().map(CachedLine::Plain).collect(),
        };

        Self {
            lyrics: CachedLyrics::Lines(lines),
            is_synced: document.is_synced(),
            song_name: song_name.into(),
            artist_name: artist_name.into(),
            cached_at,
        }
    }

    /// Rebuild the document. `is_synced` decides the variant.
    pub fn document(&self) -> LyricsDocument {
        match &self.lyrics {
            CachedLyrics::Raw(raw) => parse_raw_lyrics(raw),
            CachedLyrics::Lines(lines) if self.is_synced => {
                let mut timed: Vec<TimedLine> = lines
                    .iter()
                    .filter_map(|line| match line {
                        CachedLine::Timed(line) if !line.text.trim().is_empty() => {
                            Some(line.clone())
                        }
                        _ => None,
                    })
                    .collect();
                if timed.is_empty() {
                    return LyricsDocument::empty();
                }
                timed.sort_by(|a, b| a.time.total_cmp(&b.time));
                LyricsDocument::Synced(timed)
            }
            CachedLyrics::Lines(lines) => LyricsDocument::Unsynced(
                lines
                    .iter()
                    .map(|line| match line {
                        CachedLine::Timed(line) => line.text.clone(),
                        CachedLine::Plain(text) => text.clone(),
                    })
                    .filter(|text| !text.trim().is_empty())
                    .collect(),
            ),
        }
    }
}

/// Listing row for cache management screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedLyricsSummary {
    pub song_id: String,
    pub song_name: String,
    pub artist_name: String,
    pub is_synced: bool,
    pub cached_at: i64,
}

#[derive(Clone)]
pub struct LyricsCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl LyricsCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn read_entry(&self, song_id: &str) -> Result<Option<CachedLyricsEntry>> {
        let Some(json) = self.store.get(&cache_key(song_id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Cached entry for a song. Storage and decode errors count as a miss.
    pub async fn get(&self, song_id: &str) -> Option<CachedLyricsEntry> {
        match self.read_entry(song_id).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(song_id, error = %e, "Lyrics cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a document. Returns whether the write succeeded.
    pub async fn store(
        &self,
        song_id: &str,
        document: &LyricsDocument,
        song_name: &str,
        artist_name: &str,
    ) -> bool {
        let entry = CachedLyricsEntry::new(
            document,
            song_name,
            artist_name,
            self.clock.unix_timestamp_millis(),
        );
        match self.write_entry(song_id, &entry).await {
            Ok(()) => {
                debug!(song_id, synced = entry.is_synced, "Cached lyrics");
                true
            }
            Err(e) => {
                warn!(song_id, error = %e, "Lyrics cache write failed");
                false
            }
        }
    }

    async fn write_entry(&self, song_id: &str, entry: &CachedLyricsEntry) -> Result<()> {
        let json = serde_json::to_string(entry)?;
        self.store.set(&cache_key(song_id), &json).await?;
        Ok(())
    }

    pub async fn delete(&self, song_id: &str) -> bool {
        match self.store.remove(&cache_key(song_id)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(song_id, error = %e, "Lyrics cache delete failed");
                false
            }
        }
    }

    pub async fn delete_many(&self, song_ids: &[String]) -> bool {
        let keys: Vec<String> = song_ids.iter().map(|id| cache_key(id)).collect();
        match self.store.multi_remove(&keys).await {
            Ok(()) => true,
            Err(e) => {
                warn!(count = keys.len(), error = %e, "Lyrics cache bulk delete failed");
                false
            }
        }
    }

    /// Remove every cached entry.
    pub async fn clear(&self) -> bool {
        match self.song_ids().await {
            Ok(ids) => self.delete_many(&ids).await,
            Err(e) => {
                warn!(error = %e, "Lyrics cache clear failed");
                false
            }
        }
    }

    /// Song ids with a cache entry, synced or not.
    pub async fn song_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys_with_prefix(CACHE_KEY_PREFIX)
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(CACHE_KEY_PREFIX).map(str::to_string))
            .collect())
    }

    /// Number of cached entries, including unsynced ones.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.song_ids().await?.len())
    }

    /// Summaries of every readable entry.
    pub async fn list(&self) -> Result<Vec<CachedLyricsSummary>> {
        let mut rows = Vec::new();
        for song_id in self.song_ids().await? {
            match self.read_entry(&song_id).await {
                Ok(Some(entry)) => rows.push(CachedLyricsSummary {
                    song_id,
                    song_name: entry.song_name,
                    artist_name: entry.artist_name,
                    is_synced: entry.is_synced,
                    cached_at: entry.cached_at,
                }),
                Ok(None) => {}
                Err(e) => warn!(song_id = %song_id, error = %e, "Skipping unreadable cache entry"),
            }
        }
        Ok(rows)
    }

    /// Every synced entry. Unsynced entries stay local and are never exported.
    pub async fn export_all(&self) -> Result<LyricsBundle> {
        let mut bundle = LyricsBundle::new();
        for song_id in self.song_ids().await? {
            match self.read_entry(&song_id).await {
                Ok(Some(entry)) if entry.is_synced => {
                    bundle.insert(song_id, entry);
                }
                Ok(_) => {}
                Err(e) => warn!(song_id = %song_id, error = %e, "Skipping unreadable cache entry"),
            }
        }
        debug!(exported = bundle.len(), "Exported cached lyrics");
        Ok(bundle)
    }

    pub async fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_all().await?)?)
    }

    /// Import synced entries from a bundle. Returns how many were written.
    pub async fn import_bundle(&self, bundle: LyricsBundle) -> Result<usize> {
        let mut imported = 0;
        for (song_id, entry) in bundle {
            if song_id.is_empty() || !entry.is_synced || entry.document().is_empty() {
                debug!(song_id = %song_id, "Skipping non-synced or empty bundle entry");
                continue;
            }
            self.write_entry(&song_id, &entry).await?;
            imported += 1;
        }
        Ok(imported)
    }

    pub async fn import_json(&self, json: &str) -> Result<usize> {
        let bundle: LyricsBundle = serde_json::from_str(json)
            .map_err(|e| LyricsError::InvalidBundle(e.to_string()))?;
        self.import_bundle(bundle).await
    }
}

impl std::fmt::Debug for LyricsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricsCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_lyrics;

    #[test]
    fn test_entry_json_shape() {
        let doc = parse_lyrics("[00:01.50]Hello");
        let entry = CachedLyricsEntry::new(&doc, "Song", "Artist", 42);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["isSynced"], true);
        assert_eq!(json["songName"], "Song");
        assert_eq!(json["artistName"], "Artist");
        assert_eq!(json["cachedAt"], 42);
        assert_eq!(json["lyrics"][0]["time"], 1.5);
        assert_eq!(json["lyrics"][0]["text"], "Hello");
    }

    #[test]
    fn test_unsynced_entry_keeps_strings() {
        let doc = parse_lyrics("one\ntwo");
        let entry = CachedLyricsEntry::new(&doc, "S", "A", 0);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""lyrics":["one","two"]"#));

        let back: CachedLyricsEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.document(), doc);
    }

    #[test]
    fn test_empty_unsynced_entry_stays_unsynced() {
        let json = r#"{"lyrics":[],"isSynced":false,"songName":"","artistName":"","cachedAt":0}"#;
        let entry: CachedLyricsEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.document(), LyricsDocument::empty());
    }

    #[test]
    fn test_raw_text_entry_is_parsed() {
        let json = r#"{"lyrics":"[00:02.00]Hi<br>[00:04.00]There","isSynced":true}"#;
        let entry: CachedLyricsEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.document().texts(), vec!["Hi", "There"]);
        assert_eq!(entry.cached_at, 0);
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("abc"), "lyrics_cache_abc");
    }
}
