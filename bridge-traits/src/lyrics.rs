//! External lyrics provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw lyrics as returned by a provider, before normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedLyrics {
    /// Plain, HTML-ish or LRC text.
    pub lyrics: String,
    /// Provider's own claim that the text carries timestamps.
    pub is_synced: bool,
}

/// Query describing the song lyrics are wanted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    pub song_id: String,
    pub name: String,
    /// Artist line as displayed under the title.
    pub subtitle: String,
    pub duration_secs: Option<u32>,
}

impl LyricsQuery {
    pub fn new(
        song_id: impl Into<String>,
        name: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> Self {
        Self {
            song_id: song_id.into(),
            name: name.into(),
            subtitle: subtitle.into(),
            duration_secs: None,
        }
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Fetch lyrics for a song.
    ///
    /// * `Ok(Some(_))` when lyrics were found
    /// * `Ok(None)` when the provider has nothing for this song
    /// * `Err(_)` on network or decoding failure
    async fn fetch(&self, query: &LyricsQuery) -> Result<Option<FetchedLyrics>>;

    /// Short provider name used in logs.
    fn name(&self) -> &'static str;
}
