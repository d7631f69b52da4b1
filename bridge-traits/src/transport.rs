//! Native track transport contract.
//!
//! The transport is the host's audio player (ExoPlayer, AVPlayer, a desktop
//! sink). It runs on its own thread or process; the core only issues control
//! calls and reads back progress at a bounded poll rate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Source handed to the transport.
///
/// Local URIs and remote URLs are interchangeable from the transport's point
/// of view; the variant only records where the bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "uri", rename_all = "snake_case")]
pub enum TrackSource {
    /// Downloaded file on the device (`file://...`).
    LocalFile(String),
    /// HTTP(S) stream.
    Remote(String),
}

impl TrackSource {
    /// Source string passed to the native player.
    pub fn as_str(&self) -> &str {
        match self {
            TrackSource::LocalFile(uri) | TrackSource::Remote(uri) => uri,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, TrackSource::LocalFile(_))
    }
}

/// Display metadata for lock-screen / notification integration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub artwork_url: Option<String>,
    pub duration: Option<Duration>,
}

/// Coarse transport state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Stopped,
    /// The loaded track reached its end.
    Ended,
}

/// One progress sample read from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransportProgress {
    pub position: Duration,
    pub duration: Duration,
    pub state: TransportState,
}

impl TransportProgress {
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }
}

/// Control surface of the native track player.
#[async_trait]
pub trait TrackTransport: Send + Sync {
    /// Replace the currently loaded track with `source`.
    async fn load(&self, source: TrackSource, metadata: TrackMetadata) -> Result<()>;

    /// Start or resume playback of the loaded track.
    async fn play(&self) -> Result<()>;

    /// Pause without unloading.
    async fn pause(&self) -> Result<()>;

    /// Stop playback and rewind.
    async fn stop(&self) -> Result<()>;

    /// Jump to an absolute position.
    async fn seek_to(&self, position: Duration) -> Result<()>;

    /// Read the current position, duration and state.
    async fn progress(&self) -> Result<TransportProgress>;

    /// Audio session the equalizer attaches to. Rebuilt on each load.
    async fn audio_session_id(&self) -> Result<Option<i32>> {
        Ok(None)
    }

    /// Used only when the host manages its own queue.
    async fn skip_to_next(&self) -> Result<()> {
        Err(BridgeError::NotAvailable(
            "transport does not manage a queue".to_string(),
        ))
    }

    /// Used only when the host manages its own queue.
    async fn skip_to_previous(&self) -> Result<()> {
        Err(BridgeError::NotAvailable(
            "transport does not manage a queue".to_string(),
        ))
    }
}
