//! Player core demonstration
//!
//! Starts the core against an in-memory store and a simulated transport,
//! plays a short queue and prints every event.
//!
//! Run with:
//! ```bash
//! cargo run -p core-service --example player_demo
//!
//! # JSON logs
//! cargo run -p core-service --example player_demo -- json
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use bridge_desktop::MemoryKeyValueStore;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::time::LogLevel;
use bridge_traits::{
    FetchedLyrics, LyricsProvider, LyricsQuery, TrackMetadata, TrackSource, TrackTransport,
    TransportProgress, TransportState,
};
use core_playback::{PlaybackMode, Song};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::PlayerCore;
use parking_lot::Mutex;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Pretends to play: position advances with wall time while playing.
#[derive(Default)]
struct SimulatedTransport {
    inner: Mutex<Sim>,
}

#[derive(Default)]
struct Sim {
    duration: Duration,
    offset: Duration,
    started: Option<Instant>,
    state: TransportState,
}

impl Sim {
    fn position(&self) -> Duration {
        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        (self.offset + elapsed).min(self.duration)
    }
}

#[async_trait]
impl TrackTransport for SimulatedTransport {
    async fn load(&self, source: TrackSource, metadata: TrackMetadata) -> BridgeResult<()> {
        info!(source = source.as_str(), title = %metadata.title, "Simulated load");
        *self.inner.lock() = Sim {
            duration: metadata.duration.unwrap_or(Duration::from_secs(3)),
            state: TransportState::Ready,
            ..Sim::default()
        };
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let mut sim = self.inner.lock();
        sim.started = Some(Instant::now());
        sim.state = TransportState::Playing;
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        let mut sim = self.inner.lock();
        sim.offset = sim.position();
        sim.started = None;
        sim.state = TransportState::Paused;
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        *self.inner.lock() = Sim {
            state: TransportState::Stopped,
            ..Sim::default()
        };
        Ok(())
    }

    async fn seek_to(&self, position: Duration) -> BridgeResult<()> {
        let mut sim = self.inner.lock();
        sim.offset = position;
        if sim.started.is_some() {
            sim.started = Some(Instant::now());
        }
        Ok(())
    }

    async fn progress(&self) -> BridgeResult<TransportProgress> {
        let sim = self.inner.lock();
        let position = sim.position();
        let state = if sim.state == TransportState::Playing && position >= sim.duration {
            TransportState::Ended
        } else {
            sim.state
        };
        Ok(TransportProgress {
            position,
            duration: sim.duration,
            state,
        })
    }
}

struct DemoLyrics;

#[async_trait]
impl LyricsProvider for DemoLyrics {
    async fn fetch(&self, query: &LyricsQuery) -> BridgeResult<Option<FetchedLyrics>> {
        Ok(Some(FetchedLyrics {
            lyrics: format!(
                "[00:00.50]{} begins\n[00:01.50]second line\n[00:02.50]last line",
                query.name
            ),
            is_synced: true,
        }))
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let format = match env::args().nth(1).as_deref() {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )
    .context("initialising logging")?;

    let config = CoreConfig::builder()
        .store(Arc::new(MemoryKeyValueStore::new()))
        .transport(Arc::new(SimulatedTransport::default()))
        .lyrics_provider(Arc::new(DemoLyrics))
        .progress_poll_interval_ms(250)
        .build()
        .context("building core config")?;

    let core = PlayerCore::start(config).await?;

    let mut events = core.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("[{:?}] {}", event.severity(), event.description());
        }
    });

    let queue = vec![
        Song::new("1", "Morning", "https://cdn.example/1.mp4").with_duration(Duration::from_secs(3)),
        Song::new("2", "Noon", "https://cdn.example/2.mp4").with_duration(Duration::from_secs(3)),
    ];
    core.engine().set_queue(queue, 0);
    core.engine().set_playback_mode(PlaybackMode::Normal);
    core.engine().play_queue_index(0).await?;

    core.engine().apply_eq_profile("BassBoost").await?;
    core.engine().toggle_favorite().await?;

    // Let both songs play through
    tokio::time::sleep(Duration::from_secs(7)).await;

    let snapshot = core.engine().snapshot();
    info!(
        favorites = ?snapshot.favorites,
        eq = %snapshot.eq.profile(),
        cached_lyrics = core.lyrics_cache().count().await?,
        "Demo finished"
    );

    core.shutdown().await;
    Ok(())
}
