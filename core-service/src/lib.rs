//! Core service façade and bootstrap.
//!
//! [`PlayerCore::start`] wires the host-provided bridges from a
//! [`CoreConfig`] into the player engine and the lyrics session, and owns
//! the background tasks that keep them in step:
//!
//! - a progress poller that reads the transport at the configured interval
//! - a lyrics driver that looks lyrics up on every song change and moves
//!   the active line as the position advances
//!
//! Desktop hosts typically enable `desktop-shims` so a missing store falls
//! back to SQLite; `lrclib` adds the LRCLib lyrics provider.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::PlayerCore;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .transport(Arc::new(NativePlayer::new()))
//!     .build()?;
//! let core = PlayerCore::start(config).await?;
//!
//! core.engine().set_queue(songs, 0);
//! core.engine().play_queue_index(0).await?;
//! # core.shutdown().await;
//! ```

pub mod error;
mod tasks;

pub use error::{CoreError, Result};

use bridge_traits::KeyValueStore;
use core_equalizer::EqualizerBridge;
use core_lyrics::{LyricsCache, LyricsSession};
use core_playback::PlayerEngine;
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_runtime::events::{CoreEvent, EqualizerEvent, EventBus, EventStream, UiEvent};
use core_runtime::logging::{init_logging, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Primary façade exposed to host applications.
pub struct PlayerCore {
    engine: Arc<PlayerEngine>,
    lyrics: Arc<LyricsSession>,
    equalizer: Arc<EqualizerBridge>,
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
    features: FeatureFlags,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PlayerCore {
    /// Build every subsystem from `config` and start the background tasks.
    ///
    /// Must be called inside a Tokio runtime. When the config carries a
    /// [`LoggerSink`](bridge_traits::LoggerSink) and no subscriber is
    /// installed yet, logging is initialised with it.
    pub async fn start(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        if let Some(sink) = config.logger_sink.clone() {
            if let Err(e) = init_logging(LoggingConfig::default().with_logger_sink(sink)) {
                debug!(error = %e, "Logging already initialised, keeping existing subscriber");
            }
        }

        let features = config.features;
        let tuning = config.tuning;
        let events = EventBus::new(tuning.event_capacity);

        let equalizer = Arc::new(EqualizerBridge::from_optional(config.equalizer).await);
        if features.enable_equalizer && !equalizer.is_available() {
            warn!("Equalizer enabled but no native module is available");
            let _ = events.emit(CoreEvent::Equalizer(EqualizerEvent::Unavailable {
                reason: "native equalizer module not present".to_string(),
            }));
        }

        let engine = Arc::new(PlayerEngine::new(
            config.transport,
            equalizer.clone(),
            config.store.clone(),
            events.clone(),
            features,
        ));
        engine.load_persisted().await;

        let cache = LyricsCache::new(config.store.clone(), config.clock);
        let lyrics = Arc::new(LyricsSession::new(
            cache,
            config.lyrics_provider,
            events.clone(),
            tuning.lyrics_retry,
        ));

        let cancel = CancellationToken::new();
        let mut handles = vec![tokio::spawn(tasks::run_progress_poller(
            engine.clone(),
            tuning.progress_poll_interval,
            cancel.child_token(),
        ))];
        if features.enable_lyrics {
            // subscribed here so no song change slips by before the task runs
            handles.push(tokio::spawn(tasks::run_lyrics_driver(
                engine.subscribe_current_song(),
                engine.subscribe_progress(),
                lyrics.clone(),
                cancel.child_token(),
            )));
        }

        info!(
            equalizer = equalizer.is_available(),
            lyrics = features.enable_lyrics,
            poll_ms = tuning.progress_poll_interval.as_millis() as u64,
            "Player core started"
        );

        Ok(Self {
            engine,
            lyrics,
            equalizer,
            store: config.store,
            events,
            features,
            cancel,
            tasks: Mutex::new(handles),
        })
    }

    /// Stop background tasks, halt the transport and detach the equalizer.
    ///
    /// Calls after the first are no-ops.
    pub async fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }

        if self.engine.current_song().is_some() {
            if let Err(e) = self.engine.stop().await {
                warn!(error = %e, "Failed to stop transport during shutdown");
            }
        }
        self.equalizer.release().await;
        info!("Player core shut down");
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn engine(&self) -> &Arc<PlayerEngine> {
        &self.engine
    }

    pub fn lyrics(&self) -> &Arc<LyricsSession> {
        &self.lyrics
    }

    pub fn lyrics_cache(&self) -> &LyricsCache {
        self.lyrics.cache()
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub fn event_stream(&self) -> EventStream {
        self.events.stream()
    }

    /// Relay the measured header avatar frame to other screens.
    pub fn publish_header_avatar_layout(&self, x: f32, y: f32, width: f32, height: f32) {
        let _ = self.events.emit(CoreEvent::Ui(UiEvent::HeaderAvatarLayout {
            x,
            y,
            width,
            height,
        }));
    }
}

impl Drop for PlayerCore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for PlayerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCore")
            .field("engine", &self.engine)
            .field("features", &self.features)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
