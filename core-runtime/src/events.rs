//! # Event Bus System
//!
//! Typed publish/subscribe for the player core using `tokio::sync::broadcast`.
//! Screens and services listen for cross-cutting signals (current track
//! changed, favorite toggled, lyric line advanced) without holding a handle
//! to the component that produced them.
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain, wrapped by [`CoreEvent`]
//! - **EventBus**: cloneable broadcast sender
//! - **EventStream**: receiver wrapper with predicate filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ PlayerEngine ├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Subscriber │
//! ┌──────────────┐     emit      │ (broadcast│                  └────────────┘
//! │LyricsSession ├──────────────>│  channel) │     subscribe    ┌────────────┐
//! └──────────────┘               │           ├─────────────────>│ Subscriber │
//!                                └───────────┘                  └────────────┘
//! ```
//!
//! Every subscriber owns its own receiver. A subscriber that panics, stops
//! polling, or falls behind never affects delivery to the others; a slow one
//! only sees `RecvError::Lagged` on its own receiver.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, FavoriteAction, FavoritesEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut sub = bus.subscribe();
//!
//! bus.emit(CoreEvent::Favorites(FavoritesEvent::Updated {
//!     song_id: "song-1".to_string(),
//!     action: FavoriteAction::Added,
//! }))
//! .ok();
//!
//! let event = sub.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Favorites(_)));
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Playback Events
//! - `TrackChanged`, `Playing`, `Paused`, `Stopped`, `Completed`, `Seeked`
//! - `ModeChanged`, `QueueChanged`, `LoadFailed`
//!
//! ### Favorites Events
//! - `Updated`: song added to or removed from favorites
//!
//! ### Lyrics Events
//! - `Loading`, `Loaded`, `Unavailable`, `Failed`, `ActiveLineChanged`
//!
//! ### Equalizer Events
//! - `ProfileApplied`, `GainChanged`, `Unavailable`
//!
//! ### UI Events
//! - `HeaderAvatarLayout`: layout of the header avatar for shared transitions
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep receiving.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! `emit` returns an error only when nobody is subscribed. Producers ignore it
//! with `.ok()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Playback(PlaybackEvent),
    Favorites(FavoritesEvent),
    Lyrics(LyricsEvent),
    Equalizer(EqualizerEvent),
    Ui(UiEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Favorites(e) => e.description(),
            CoreEvent::Lyrics(e) => e.description(),
            CoreEvent::Equalizer(e) => e.description(),
            CoreEvent::Ui(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::LoadFailed { .. }) => EventSeverity::Error,
            CoreEvent::Lyrics(LyricsEvent::Failed { .. }) => EventSeverity::Warning,
            CoreEvent::Equalizer(EqualizerEvent::Unavailable { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::TrackChanged { .. }) => EventSeverity::Info,
            CoreEvent::Favorites(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to the queue and the native transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new song was loaded into the transport.
    TrackChanged {
        song_id: String,
        title: String,
        /// Cursor position after the change.
        queue_index: Option<usize>,
    },
    /// Playback started or resumed.
    Playing { song_id: String },
    /// Playback paused.
    Paused {
        song_id: String,
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// Playback stopped (end of queue or explicit stop).
    Stopped { song_id: Option<String> },
    /// Track finished playing naturally.
    Completed { song_id: String },
    /// An explicit seek was committed.
    Seeked { song_id: String, position_ms: u64 },
    /// Playback mode advanced (`normal`, `repeat`, `repeat_one`, `shuffle`).
    ModeChanged { mode: String },
    /// Queue replaced or edited.
    QueueChanged {
        length: usize,
        current_index: Option<usize>,
    },
    /// The transport could not load a song. The previous track stays current.
    LoadFailed {
        song_id: String,
        /// Human-readable error message.
        message: String,
        /// Whether retrying may succeed (network errors).
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::TrackChanged { .. } => "Track changed",
            PlaybackEvent::Playing { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::Seeked { .. } => "Playback position changed",
            PlaybackEvent::ModeChanged { .. } => "Playback mode changed",
            PlaybackEvent::QueueChanged { .. } => "Queue changed",
            PlaybackEvent::LoadFailed { .. } => "Couldn't play this track",
        }
    }
}

// ============================================================================
// Favorites Events
// ============================================================================

/// Result of toggling a song's favorite membership.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
    Added,
    Removed,
}

/// Favorites membership changes (`favoritesUpdated`).
///
/// Any screen showing the song can play its heart / thumbs-down feedback
/// without talking to the player screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum FavoritesEvent {
    Updated {
        song_id: String,
        action: FavoriteAction,
    },
}

impl FavoritesEvent {
    fn description(&self) -> &str {
        match self {
            FavoritesEvent::Updated {
                action: FavoriteAction::Added,
                ..
            } => "Added to favorites",
            FavoritesEvent::Updated {
                action: FavoriteAction::Removed,
                ..
            } => "Removed from favorites",
        }
    }
}

// ============================================================================
// Lyrics Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LyricsEvent {
    /// Lookup started for a song.
    Loading { song_id: String },
    /// A document is ready for display.
    Loaded {
        song_id: String,
        synced: bool,
        line_count: usize,
        from_cache: bool,
    },
    /// Neither the cache nor the provider had lyrics.
    Unavailable { song_id: String },
    /// Lookup failed; the visible document is empty.
    Failed { song_id: String, message: String },
    /// The highlighted line moved. `None` before the first timestamp.
    ActiveLineChanged {
        song_id: String,
        index: Option<usize>,
    },
}

impl LyricsEvent {
    fn description(&self) -> &str {
        match self {
            LyricsEvent::Loading { .. } => "Loading lyrics",
            LyricsEvent::Loaded { .. } => "Lyrics loaded",
            LyricsEvent::Unavailable { .. } => "No lyrics found",
            LyricsEvent::Failed { .. } => "Lyrics lookup failed",
            LyricsEvent::ActiveLineChanged { .. } => "Active lyric line changed",
        }
    }
}

// ============================================================================
// Equalizer Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum EqualizerEvent {
    /// A named preset replaced the gain vector.
    ProfileApplied {
        profile: String,
        gains: Vec<f32>,
        /// Whether the native module accepted the gains.
        applied: bool,
    },
    /// A single band was edited; the profile is now `Custom`.
    GainChanged { band: usize, gain: f32, applied: bool },
    /// The native module is missing on this device.
    Unavailable { reason: String },
}

impl EqualizerEvent {
    fn description(&self) -> &str {
        match self {
            EqualizerEvent::ProfileApplied { .. } => "Equalizer profile applied",
            EqualizerEvent::GainChanged { .. } => "Equalizer gain changed",
            EqualizerEvent::Unavailable { .. } => "Equalizer unavailable",
        }
    }
}

// ============================================================================
// UI Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum UiEvent {
    /// Measured frame of the header avatar, in screen points.
    HeaderAvatarLayout {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl UiEvent {
    fn description(&self) -> &str {
        match self {
            UiEvent::HeaderAvatarLayout { .. } => "Header avatar layout measured",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe through an [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with predicate filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus};
///
/// let bus = EventBus::new(100);
/// let lyrics_only = bus.stream().filter(|event| matches!(event, CoreEvent::Lyrics(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
