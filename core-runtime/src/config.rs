//! # Core Configuration Module
//!
//! Builder-based configuration for the player core.
//!
//! ## Overview
//!
//! `CoreConfig` carries every host capability and tunable the core needs.
//! The builder validates eagerly so a misconfigured host fails at startup
//! with an actionable message instead of deep inside playback.
//!
//! ## Required Dependencies
//!
//! - `KeyValueStore` - lyrics cache, favorites, player settings
//! - `TrackTransport` - the native audio player
//!
//! ## Optional Dependencies
//!
//! - `EqualizerModule` - missing module degrades to a no-op equalizer
//! - `LyricsProvider` - missing provider yields empty lyric documents
//! - `Clock` - defaults to `SystemClock`
//! - `LoggerSink` - host log forwarding
//!
//! When the `desktop-shims` feature is enabled a missing store defaults to a
//! `SqliteKeyValueStore`; with `lrclib` also enabled a missing lyrics provider
//! defaults to `LrcLibProvider`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .store(Arc::new(MyStore))
//!     .transport(Arc::new(MyTransport))
//!     .equalizer(Arc::new(MyEqualizer))
//!     .progress_poll_interval_ms(100)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    Clock, EqualizerModule, KeyValueStore, LoggerSink, LyricsProvider, SystemClock,
    TrackTransport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Main configuration structure for the player core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Persistent key-value store shared by cache, favorites and settings.
    pub store: Arc<dyn KeyValueStore>,

    /// Native track player.
    pub transport: Arc<dyn TrackTransport>,

    /// Native equalizer module (platform-gated).
    pub equalizer: Option<Arc<dyn EqualizerModule>>,

    /// Remote lyrics lookup.
    pub lyrics_provider: Option<Arc<dyn LyricsProvider>>,

    /// Wall clock used for cache timestamps.
    pub clock: Arc<dyn Clock>,

    /// Host log forwarding.
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    pub tuning: PlaybackTuning,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("store", &"KeyValueStore { ... }")
            .field("transport", &"TrackTransport { ... }")
            .field(
                "equalizer",
                &self.equalizer.as_ref().map(|_| "EqualizerModule { ... }"),
            )
            .field(
                "lyrics_provider",
                &self
                    .lyrics_provider
                    .as_ref()
                    .map(|provider| provider.name()),
            )
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("tuning", &self.tuning)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature toggles for optional subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Fetch, cache and track lyrics on song change.
    pub enable_lyrics: bool,

    /// Drive the native equalizer. When off, gains are tracked but never pushed.
    pub enable_equalizer: bool,

    /// Persist favorites under the `favorites` key.
    pub persist_favorites: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_lyrics: true,
            enable_equalizer: true,
            persist_favorites: true,
        }
    }
}

/// Retry policy for remote lookups (lyrics provider).
///
/// Delay for attempt `n` (0-based) is `base_delay * 2^n`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Timing tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTuning {
    /// How often the transport is polled for position (sub-second).
    pub progress_poll_interval: Duration,

    /// Per-subscriber buffer of the event bus.
    pub event_capacity: usize,

    pub lyrics_retry: RetryPolicy,
}

impl Default for PlaybackTuning {
    fn default() -> Self {
        Self {
            progress_poll_interval: Duration::from_millis(100),
            event_capacity: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
            lyrics_retry: RetryPolicy::default(),
        }
    }
}

impl PlaybackTuning {
    pub fn validate(&self) -> Result<()> {
        if self.progress_poll_interval.is_zero()
            || self.progress_poll_interval >= Duration::from_secs(1)
        {
            return Err(Error::Config(format!(
                "Progress poll interval must be between 1ms and 999ms (got {}ms)",
                self.progress_poll_interval.as_millis()
            )));
        }

        if self.event_capacity == 0 {
            return Err(Error::Config(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        if self.lyrics_retry.max_attempts == 0 {
            return Err(Error::Config(
                "Lyrics retry needs at least one attempt".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.tuning.validate()
    }
}

fn transport_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "TrackTransport".to_string(),
        message: "TrackTransport implementation is required for playback. \
                 Mobile: inject the native player (ExoPlayer/AVPlayer) adapter. \
                 Tests: inject a recording fake."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "KeyValueStore".to_string(),
        message: "KeyValueStore implementation is required for favorites, settings and the lyrics cache. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteKeyValueStore. \
                 Mobile: inject platform-native storage (AsyncStorage/UserDefaults)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_store(data_dir: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    use bridge_desktop::SqliteKeyValueStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let path = match data_dir {
        Some(dir) => dir.join("store.db"),
        None => {
            let base = dirs::data_dir().ok_or_else(|| {
                Error::Config(
                    "No platform data directory; set one with .data_dir()".to_string(),
                )
            })?;
            SqliteKeyValueStore::default_path(&base, "player")
        }
    };

    let init_store = |path: PathBuf| -> Result<SqliteKeyValueStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!("Could not start a runtime to open the store: {}", e))
            })?;

        runtime
            .block_on(SqliteKeyValueStore::new(path.clone()))
            .map_err(|e| Error::DefaultStore {
                path,
                message: e.to_string(),
            })
    };

    // block_on panics inside a runtime, so hop to a plain thread there
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal("Store opener thread panicked".to_string())
            })??,
        Err(_) => init_store(path)?,
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_store(_data_dir: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    Err(store_missing_error())
}

#[cfg(feature = "lrclib")]
fn provide_default_lyrics_provider() -> Option<Arc<dyn LyricsProvider>> {
    match bridge_desktop::LrcLibProvider::new() {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::warn!(error = %e, "LRCLib provider unavailable");
            None
        }
    }
}

#[cfg(not(feature = "lrclib"))]
fn provide_default_lyrics_provider() -> Option<Arc<dyn LyricsProvider>> {
    None
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    transport: Option<Arc<dyn TrackTransport>>,
    equalizer: Option<Arc<dyn EqualizerModule>>,
    lyrics_provider: Option<Arc<dyn LyricsProvider>>,
    clock: Option<Arc<dyn Clock>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    data_dir: Option<PathBuf>,
    tuning: PlaybackTuning,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn TrackTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn equalizer(mut self, equalizer: Arc<dyn EqualizerModule>) -> Self {
        self.equalizer = Some(equalizer);
        self
    }

    pub fn lyrics_provider(mut self, provider: Arc<dyn LyricsProvider>) -> Self {
        self.lyrics_provider = Some(provider);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Directory for the default desktop store.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn progress_poll_interval_ms(mut self, millis: u64) -> Self {
        self.tuning.progress_poll_interval = Duration::from_millis(millis);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.tuning.event_capacity = capacity;
        self
    }

    pub fn lyrics_retry(mut self, retry: RetryPolicy) -> Self {
        self.tuning.lyrics_retry = retry;
        self
    }

    pub fn tuning(mut self, tuning: PlaybackTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn enable_lyrics(mut self, enabled: bool) -> Self {
        self.features.enable_lyrics = enabled;
        self
    }

    pub fn enable_equalizer(mut self, enabled: bool) -> Self {
        self.features.enable_equalizer = enabled;
        self
    }

    pub fn persist_favorites(mut self, enabled: bool) -> Self {
        self.features.persist_favorites = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn build(self) -> Result<CoreConfig> {
        self.tuning.validate()?;

        let transport = self.transport.ok_or_else(transport_missing_error)?;

        let store = match self.store {
            Some(store) => store,
            None => provide_default_store(self.data_dir)?,
        };

        let lyrics_provider = self
            .lyrics_provider
            .or_else(provide_default_lyrics_provider);

        let config = CoreConfig {
            store,
            transport,
            equalizer: self.equalizer,
            lyrics_provider,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logger_sink: self.logger_sink,
            tuning: self.tuning,
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}
