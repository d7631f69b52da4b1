//! # Lyrics Module
//!
//! Produces a displayable lyrics document for the current song and tracks
//! which line is active as playback advances.
//!
//! ## Pipeline
//!
//! 1. [`LyricsSession::load_for_song`] reads the [`LyricsCache`] and falls
//!    back to the host [`LyricsProvider`](bridge_traits::LyricsProvider)
//! 2. Provider text goes through [`normalize_lyrics_text`] then [`parse_lyrics`]
//! 3. [`LyricsSession::update_position`] drives the [`ActiveLineTracker`]
//!
//! A later song selection invalidates any lookup still in flight; its
//! result is discarded rather than shown or cached.

pub mod cache;
pub mod error;
pub mod parser;
pub mod session;
pub mod tracker;

pub use cache::{
    cache_key, CachedLine, CachedLyrics, CachedLyricsEntry, CachedLyricsSummary, LyricsBundle,
    LyricsCache, CACHE_KEY_PREFIX,
};
pub use error::{LyricsError, Result};
pub use parser::{normalize_lyrics_text, parse_lyrics, parse_raw_lyrics, LyricsDocument, TimedLine};
pub use session::{LoadOutcome, LyricsSession, LyricsStatus, LyricsView};
pub use tracker::{resolve_active_line, ActiveLineTracker};
