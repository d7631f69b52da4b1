//! PlayerCore wiring tests
//!
//! This test suite verifies:
//! - Persisted state is restored on start
//! - The lyrics driver looks lyrics up on song change
//! - The progress poller moves the active lyric line and auto-advances
//! - Shutdown stops tasks and releases the equalizer

use async_trait::async_trait;
use bridge_desktop::MemoryKeyValueStore;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BandGains, EqualizerModule, FetchedLyrics, KeyValueStore, LyricsProvider, LyricsQuery,
    TrackMetadata, TrackSource, TrackTransport, TransportProgress, TransportState,
};
use core_lyrics::LyricsStatus;
use core_playback::Song;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, LyricsEvent, PlaybackEvent, UiEvent};
use core_service::PlayerCore;
use mockall::mock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeTransport {
    progress: Mutex<TransportProgress>,
    stops: AtomicUsize,
}

impl FakeTransport {
    fn set(&self, position_ms: u64, state: TransportState) {
        *self.progress.lock() = TransportProgress {
            position: Duration::from_millis(position_ms),
            duration: Duration::from_secs(180),
            state,
        };
    }
}

#[async_trait]
impl TrackTransport for FakeTransport {
    async fn load(&self, _source: TrackSource, _metadata: TrackMetadata) -> BridgeResult<()> {
        self.set(0, TransportState::Ready);
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        self.progress.lock().state = TransportState::Playing;
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.progress.lock().state = TransportState::Paused;
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.progress.lock().state = TransportState::Stopped;
        Ok(())
    }

    async fn seek_to(&self, position: Duration) -> BridgeResult<()> {
        self.progress.lock().position = position;
        Ok(())
    }

    async fn progress(&self) -> BridgeResult<TransportProgress> {
        Ok(*self.progress.lock())
    }

    async fn audio_session_id(&self) -> BridgeResult<Option<i32>> {
        Ok(Some(3))
    }
}

struct StaticProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl LyricsProvider for StaticProvider {
    async fn fetch(&self, _query: &LyricsQuery) -> BridgeResult<Option<FetchedLyrics>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(FetchedLyrics {
            lyrics: "[00:01.00]first\n[00:10.00]second\n[00:20.00]third".to_string(),
            is_synced: true,
        }))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

mock! {
    pub Module {}

    #[async_trait]
    impl EqualizerModule for Module {
        async fn is_available(&self) -> bool;
        async fn init(&self, session_id: i32) -> BridgeResult<()>;
        async fn set_gains(&self, gains: BandGains) -> BridgeResult<()>;
        async fn set_enabled(&self, enabled: bool) -> BridgeResult<()>;
        async fn release(&self) -> BridgeResult<()>;
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Fixture {
    transport: Arc<FakeTransport>,
    store: Arc<MemoryKeyValueStore>,
    provider: Arc<StaticProvider>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            transport: Arc::new(FakeTransport::default()),
            store: Arc::new(MemoryKeyValueStore::new()),
            provider: Arc::new(StaticProvider {
                calls: AtomicUsize::new(0),
            }),
        }
    }

    fn config(&self) -> core_runtime::config::CoreConfigBuilder {
        CoreConfig::builder()
            .store(self.store.clone())
            .transport(self.transport.clone())
            .lyrics_provider(self.provider.clone())
            .progress_poll_interval_ms(10)
    }
}

fn song(id: &str) -> Song {
    Song::new(id, format!("Title {id}"), format!("https://cdn/{id}.mp4"))
}

async fn wait_for<F>(rx: &mut Receiver<CoreEvent>, mut predicate: F) -> CoreEvent
where
    F: FnMut(&CoreEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event bus closed: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_start_restores_persisted_state() {
    let fixture = Fixture::new();
    fixture.store.set("favorites", r#"["x","y"]"#).await.unwrap();
    fixture
        .store
        .set("player_settings", r#"{"eqProfile":"Jazz","streamQuality":"96kbps"}"#)
        .await
        .unwrap();

    let core = PlayerCore::start(fixture.config().build().unwrap())
        .await
        .unwrap();

    assert!(core.engine().is_favorite("x"));
    assert!(core.engine().is_favorite("y"));
    assert_eq!(core.engine().eq_state().profile().name(), "Jazz");
    assert!(!core.engine().equalizer().is_available());
    assert!(core.is_running());

    core.shutdown().await;
}

#[tokio::test]
async fn test_song_change_loads_lyrics_and_tracks_position() {
    let fixture = Fixture::new();
    let core = PlayerCore::start(fixture.config().build().unwrap())
        .await
        .unwrap();
    let mut events = core.subscribe();

    core.engine().play_song(song("a")).await.unwrap();

    let loaded = wait_for(&mut events, |e| {
        matches!(e, CoreEvent::Lyrics(LyricsEvent::Loaded { .. }))
    })
    .await;
    assert_eq!(
        loaded,
        CoreEvent::Lyrics(LyricsEvent::Loaded {
            song_id: "a".into(),
            synced: true,
            line_count: 3,
            from_cache: false,
        })
    );
    assert_eq!(core.lyrics().view().status, LyricsStatus::Ready);
    assert_eq!(core.lyrics_cache().count().await.unwrap(), 1);

    fixture.transport.set(12_000, TransportState::Playing);
    wait_for(&mut events, |e| {
        matches!(
            e,
            CoreEvent::Lyrics(LyricsEvent::ActiveLineChanged { index: Some(1), .. })
        )
    })
    .await;
    assert_eq!(core.lyrics().view().active_index, Some(1));

    core.shutdown().await;
}

#[tokio::test]
async fn test_poller_auto_advances_on_track_end() {
    let fixture = Fixture::new();
    let core = PlayerCore::start(fixture.config().enable_lyrics(false).build().unwrap())
        .await
        .unwrap();
    let mut events = core.subscribe();

    core.engine().set_queue(vec![song("a"), song("b")], 0);
    core.engine().play_queue_index(0).await.unwrap();
    fixture.transport.set(180_000, TransportState::Ended);

    wait_for(&mut events, |e| {
        matches!(
            e,
            CoreEvent::Playback(PlaybackEvent::TrackChanged { song_id, .. }) if song_id == "b"
        )
    })
    .await;
    assert_eq!(core.engine().queue_index(), Some(1));

    core.shutdown().await;
    // lyrics disabled: nothing was looked up
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_releases_equalizer_once() {
    let mut module = MockModule::new();
    module.expect_is_available().times(1).return_const(true);
    module.expect_init().returning(|_| Ok(()));
    module.expect_set_enabled().returning(|_| Ok(()));
    module.expect_set_gains().returning(|_| Ok(()));
    module.expect_release().times(1).returning(|| Ok(()));

    let fixture = Fixture::new();
    let core = PlayerCore::start(
        fixture
            .config()
            .equalizer(Arc::new(module))
            .build()
            .unwrap(),
    )
    .await
    .unwrap();
    assert!(core.engine().equalizer().is_available());

    core.engine().play_song(song("a")).await.unwrap();

    core.shutdown().await;
    core.shutdown().await;

    assert!(!core.is_running());
    assert_eq!(fixture.transport.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_header_avatar_layout_is_broadcast() {
    let fixture = Fixture::new();
    let core = PlayerCore::start(fixture.config().build().unwrap())
        .await
        .unwrap();
    let mut first = core.subscribe();
    let mut second = core.subscribe();

    core.publish_header_avatar_layout(16.0, 48.0, 40.0, 40.0);

    let expected = CoreEvent::Ui(UiEvent::HeaderAvatarLayout {
        x: 16.0,
        y: 48.0,
        width: 40.0,
        height: 40.0,
    });
    assert_eq!(first.recv().await.unwrap(), expected);
    assert_eq!(second.recv().await.unwrap(), expected);

    core.shutdown().await;
}
