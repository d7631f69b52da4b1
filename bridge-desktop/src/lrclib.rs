//! LRCLib lyrics provider using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    lyrics::{FetchedLyrics, LyricsProvider, LyricsQuery},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://lrclib.net/api";

/// Free lyrics database with synced (LRC) and plain lyrics.
///
/// Synced lyrics are preferred; plain lyrics are the fallback. A 404 is
/// reported as "no lyrics" rather than an error.
pub struct LrcLibProvider {
    client: Client,
    base_url: String,
}

impl LrcLibProvider {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("player-core/0.1.0")
            .build()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to build client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different server (self-hosted mirror, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn select(response: LrcLibResponse) -> Option<FetchedLyrics> {
        if let Some(synced) = response.synced_lyrics.filter(|s| !s.trim().is_empty()) {
            return Some(FetchedLyrics {
                lyrics: synced,
                is_synced: true,
            });
        }

        response
            .plain_lyrics
            .filter(|s| !s.trim().is_empty())
            .map(|plain| FetchedLyrics {
                lyrics: plain,
                is_synced: false,
            })
    }
}

#[async_trait]
impl LyricsProvider for LrcLibProvider {
    async fn fetch(&self, query: &LyricsQuery) -> Result<Option<FetchedLyrics>> {
        let mut params = vec![
            ("track_name", query.name.clone()),
            ("artist_name", query.subtitle.clone()),
        ];
        if let Some(duration) = query.duration_secs {
            params.push(("duration", duration.to_string()));
        }

        let url = format!("{}/get", self.base_url);
        debug!(song_id = %query.song_id, url = %url, "Requesting lyrics");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("LRCLib request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "LRCLib API error: HTTP {}",
                response.status()
            )));
        }

        let body: LrcLibResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Parse error: {}", e)))?;

        Ok(Self::select(body))
    }

    fn name(&self) -> &'static str {
        "lrclib"
    }
}

#[derive(Debug, Deserialize)]
struct LrcLibResponse {
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
}
