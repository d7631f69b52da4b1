//! # Host Bridge Traits
//!
//! Capability contracts the player core consumes from its host.
//!
//! ## Overview
//!
//! The core owns queue, mode, favorites, equalizer and lyrics state; anything
//! that touches the device lives behind one of these traits and is
//! implemented per platform (desktop shims ship in `bridge-desktop`, mobile
//! hosts inject their own adapters).
//!
//! ## Traits
//!
//! ### Playback
//! - [`TrackTransport`](transport::TrackTransport) - Native player: load, play, pause, seek, progress
//! - [`EqualizerModule`](equalizer::EqualizerModule) - Platform-gated 8-band equalizer
//!
//! ### Data
//! - [`KeyValueStore`](storage::KeyValueStore) - String key-value persistence
//! - [`LyricsProvider`](lyrics::LyricsProvider) - Remote lyrics lookup
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Missing capabilities
//!
//! Required capabilities (store, transport) are checked when the core is
//! configured and fail fast with `CapabilityMissing`. Optional ones
//! (equalizer, lyrics provider) degrade to no-ops: the equalizer module is
//! feature-detected once and every later call short-circuits to `false`.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared through
//! `Arc` across async tasks.

pub mod equalizer;
pub mod error;
pub mod lyrics;
pub mod storage;
pub mod time;
pub mod transport;

pub use error::BridgeError;

// Re-export commonly used types
pub use equalizer::{BandGains, EqualizerModule, EQ_BAND_COUNT};
pub use lyrics::{FetchedLyrics, LyricsProvider, LyricsQuery};
pub use storage::KeyValueStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
pub use transport::{TrackMetadata, TrackSource, TrackTransport, TransportProgress, TransportState};
