//! # Playback & Queue Module
//!
//! Owns the play queue, the loaded song, playback mode, favorites and the
//! equalizer gain state, and drives the host's native track transport.
//!
//! ## Overview
//!
//! This module handles:
//! - Normalising catalog payloads into [`Song`] records
//! - Queue navigation per [`PlaybackMode`] (normal, repeat, repeat-one, shuffle)
//! - Position tracking with seek-gesture suppression
//! - Reapplying equalizer gains after every track load
//! - Persisting favorites and player settings

pub mod engine;
pub mod error;
pub mod favorites;
pub mod mode;
pub mod progress;
pub mod queue;
pub mod settings;
pub mod song;

pub use engine::{EngineSnapshot, PlayerEngine};
pub use error::{PlaybackError, Result};
pub use favorites::{Favorites, FAVORITES_KEY};
pub use mode::{next_index, previous_index, PlaybackMode};
pub use progress::{Observation, ProgressSnapshot, ProgressTracker};
pub use queue::Queue;
pub use settings::{PlayerSettings, SETTINGS_KEY};
pub use song::{AlbumRef, ImageQuality, QualityUrl, RawSong, Song, StreamQuality};
