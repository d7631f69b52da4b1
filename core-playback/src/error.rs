//! # Playback Error Types
//!
//! Errors surfaced by the player engine. Only explicit user actions return
//! them; background reconciliation (favorites, settings, progress polling)
//! logs and carries on.

use bridge_traits::BridgeError;
use core_equalizer::EqError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Catalog payload could not be turned into a song.
    #[error("Invalid song: {0}")]
    InvalidSong(String),

    /// Song has neither a local file nor a remote source.
    #[error("No playable source for song {0}")]
    NoPlayableSource(String),

    /// The transport rejected the source (network error, missing file).
    #[error("Couldn't load {song_id}: {message}")]
    LoadFailed { song_id: String, message: String },

    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// Queue index out of range.
    #[error("Queue index {index} out of range (queue has {len} songs)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Attempted operation when no song is loaded.
    #[error("No song loaded")]
    NoSongLoaded,

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// Equalizer state rejected the edit.
    #[error("Equalizer error: {0}")]
    Equalizer(#[from] EqError),

    /// Transport control call failed.
    #[error("Transport error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if the host should show this to the user.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailed { .. } | PlaybackError::NoPlayableSource(_)
        )
    }

    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::LoadFailed { message, .. } => is_network_message(message),
            PlaybackError::Bridge(BridgeError::OperationFailed(message)) => {
                is_network_message(message)
            }
            PlaybackError::Bridge(BridgeError::Io(_)) => true,
            _ => false,
        }
    }
}

fn is_network_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["network", "timeout", "timed out", "connection", "unreachable"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let network = PlaybackError::LoadFailed {
            song_id: "s".into(),
            message: "Network timeout".into(),
        };
        assert!(network.is_user_visible());
        assert!(network.is_transient());

        let missing = PlaybackError::LoadFailed {
            song_id: "s".into(),
            message: "file not found".into(),
        };
        assert!(missing.is_user_visible());
        assert!(!missing.is_transient());

        let eq: PlaybackError = EqError::BandOutOfRange { index: 9, count: 8 }.into();
        assert!(!eq.is_user_visible());
        assert!(!eq.is_transient());
    }
}
