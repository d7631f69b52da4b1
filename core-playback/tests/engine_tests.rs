//! Player engine against a recording transport
//!
//! This test suite verifies:
//! - Source selection and queue placement on play
//! - Next/previous resolution per playback mode
//! - Load failures leaving the previous track intact
//! - Favorites, mode cycling and persistence
//! - Equalizer reapplication and drag commits
//! - Seek gesture suppression and end-of-track handling

use async_trait::async_trait;
use bridge_desktop::MemoryKeyValueStore;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    BandGains, EqualizerModule, KeyValueStore, TrackMetadata, TrackSource, TrackTransport,
    TransportProgress, TransportState,
};
use core_equalizer::{EqProfile, EqualizerBridge, FLAT};
use core_playback::{
    PlaybackError, PlaybackMode, PlayerEngine, RawSong, Song, StreamQuality, FAVORITES_KEY,
    SETTINGS_KEY,
};
use core_runtime::config::FeatureFlags;
use core_runtime::events::{
    CoreEvent, EqualizerEvent, EventBus, FavoriteAction, FavoritesEvent, PlaybackEvent,
};
use mockall::mock;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::sync::Notify;

// ============================================================================
// Recording transport
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(TrackSource),
    Play,
    Pause,
    Stop,
    Seek(Duration),
}

#[derive(Default)]
struct FakeTransport {
    calls: Mutex<Vec<Call>>,
    progress: Mutex<TransportProgress>,
    failing: Mutex<HashSet<String>>,
    /// Held loads park here until released.
    load_gate: Mutex<Option<Arc<Notify>>>,
    load_entered: Notify,
}

impl FakeTransport {
    fn fail_uri(&self, uri: &str) {
        self.failing.lock().insert(uri.to_string());
    }

    /// Park the next load until the returned handle is notified.
    fn hold_next_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.load_gate.lock() = Some(gate.clone());
        gate
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Load(source) => Some(source.as_str().to_string()),
                _ => None,
            })
            .collect()
    }

    fn set_progress(&self, position_ms: u64, state: TransportState) {
        let mut progress = self.progress.lock();
        progress.position = Duration::from_millis(position_ms);
        progress.duration = Duration::from_secs(180);
        progress.state = state;
    }
}

#[async_trait]
impl TrackTransport for FakeTransport {
    async fn load(&self, source: TrackSource, _metadata: TrackMetadata) -> BridgeResult<()> {
        let gate = self.load_gate.lock().take();
        if let Some(gate) = gate {
            self.load_entered.notify_one();
            gate.notified().await;
        }
        if self.failing.lock().contains(source.as_str()) {
            return Err(BridgeError::OperationFailed("network timeout".into()));
        }
        self.calls.lock().push(Call::Load(source));
        *self.progress.lock() = TransportProgress {
            state: TransportState::Ready,
            ..TransportProgress::default()
        };
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        self.calls.lock().push(Call::Play);
        self.progress.lock().state = TransportState::Playing;
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.calls.lock().push(Call::Pause);
        self.progress.lock().state = TransportState::Paused;
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.calls.lock().push(Call::Stop);
        self.progress.lock().state = TransportState::Stopped;
        Ok(())
    }

    async fn seek_to(&self, position: Duration) -> BridgeResult<()> {
        self.calls.lock().push(Call::Seek(position));
        self.progress.lock().position = position;
        Ok(())
    }

    async fn progress(&self) -> BridgeResult<TransportProgress> {
        Ok(*self.progress.lock())
    }

    async fn audio_session_id(&self) -> BridgeResult<Option<i32>> {
        Ok(Some(7))
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

struct Harness {
    engine: Arc<PlayerEngine>,
    transport: Arc<FakeTransport>,
    store: Arc<MemoryKeyValueStore>,
    events: Receiver<CoreEvent>,
}

fn harness_with(bridge: EqualizerBridge, store: Arc<MemoryKeyValueStore>) -> Harness {
    let transport = Arc::new(FakeTransport::default());
    let bus = EventBus::new(256);
    let events = bus.subscribe();
    let engine = Arc::new(
        PlayerEngine::new(
            transport.clone(),
            Arc::new(bridge),
            store.clone(),
            bus,
            FeatureFlags::default(),
        )
        .with_seed(42),
    );

    Harness {
        engine,
        transport,
        store,
        events,
    }
}

fn harness() -> Harness {
    harness_with(
        EqualizerBridge::unavailable(),
        Arc::new(MemoryKeyValueStore::new()),
    )
}

fn song(id: &str) -> Song {
    Song::new(id, format!("Title {id}"), format!("https://cdn/{id}.mp4"))
}

fn songs(ids: &[&str]) -> Vec<Song> {
    ids.iter().map(|id| song(id)).collect()
}

fn playback_events(rx: &mut Receiver<CoreEvent>) -> Vec<PlaybackEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Playback(event) = event {
            out.push(event);
        }
    }
    out
}

fn drain(rx: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

// ============================================================================
// Playing songs
// ============================================================================

#[tokio::test]
async fn test_local_uri_preferred_over_remote() {
    let h = harness();
    let downloaded = song("a").with_local_uri("file:///music/a.m4a");

    h.engine.play_song(downloaded).await.unwrap();

    assert_eq!(
        h.transport.calls()[0],
        Call::Load(TrackSource::LocalFile("file:///music/a.m4a".into()))
    );
}

#[tokio::test]
async fn test_play_song_publishes_and_inserts_after_cursor() {
    let mut h = harness();
    let mut current = h.engine.subscribe_current_song();
    h.engine.set_queue(songs(&["a", "b", "c"]), 0);

    h.engine.play_song(song("x")).await.unwrap();

    assert_eq!(h.engine.queue_index(), Some(1));
    let ids: Vec<_> = h.engine.queue().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["a", "x", "b", "c"]);

    assert!(current.has_changed().unwrap());
    assert_eq!(current.borrow_and_update().as_ref().unwrap().id, "x");

    let events = playback_events(&mut h.events);
    assert!(events.contains(&PlaybackEvent::TrackChanged {
        song_id: "x".into(),
        title: "Title x".into(),
        queue_index: Some(1),
    }));
    assert!(events.contains(&PlaybackEvent::Playing {
        song_id: "x".into()
    }));
}

#[tokio::test]
async fn test_play_song_already_queued_moves_cursor() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b", "c"]), 0);
    h.engine.play_song(song("c")).await.unwrap();

    assert_eq!(h.engine.queue_index(), Some(2));
    assert_eq!(h.engine.queue().len(), 3);
}

#[tokio::test]
async fn test_set_queue_does_not_start_playback() {
    let mut h = harness();
    h.engine.set_queue(songs(&["a", "b"]), 1);

    assert!(h.transport.calls().is_empty());
    assert!(h.engine.current_song().is_none());
    assert_eq!(h.engine.queue_index(), Some(1));
    assert_eq!(
        playback_events(&mut h.events),
        vec![PlaybackEvent::QueueChanged {
            length: 2,
            current_index: Some(1)
        }]
    );
}

#[tokio::test]
async fn test_load_failure_keeps_previous_track() {
    let mut h = harness();
    h.engine.set_queue(songs(&["a", "b"]), 0);
    h.engine.play_queue_index(0).await.unwrap();
    h.transport.fail_uri("https://cdn/b.mp4");
    drain(&mut h.events);

    let err = h.engine.next_song().await.unwrap_err();
    assert!(err.is_user_visible());
    assert!(err.is_transient());

    assert_eq!(h.engine.current_song().unwrap().id, "a");
    assert_eq!(h.engine.queue_index(), Some(0));

    let events = playback_events(&mut h.events);
    assert!(matches!(
        events.as_slice(),
        [PlaybackEvent::LoadFailed { song_id, recoverable: true, .. }] if song_id == "b"
    ));
}

#[tokio::test]
async fn test_unplayable_song_rejected() {
    let h = harness();
    let mut silent = song("a");
    silent.sources.clear();

    let err = h.engine.play_song(silent).await.unwrap_err();
    assert!(matches!(err, PlaybackError::NoPlayableSource(id) if id == "a"));
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_play_queue_index_out_of_range() {
    let h = harness();
    h.engine.set_queue(songs(&["a"]), 0);
    let err = h.engine.play_queue_index(3).await.unwrap_err();
    assert!(matches!(err, PlaybackError::IndexOutOfRange { index: 3, len: 1 }));
}

#[tokio::test]
async fn test_inject_shared_song_from_payload() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b"]), 0);

    let raw = RawSong::from_json(
        r#"{"id": "nfc", "name": "Shared", "downloadUrl": [{"quality": "160kbps", "url": "https://cdn/nfc"}]}"#,
    )
    .unwrap();
    h.engine.inject_shared_song(raw).await.unwrap();

    assert_eq!(h.engine.current_song().unwrap().id, "nfc");
    assert_eq!(h.engine.queue_index(), Some(1));
}

#[tokio::test]
async fn test_shared_song_with_oversized_duration_still_plays() {
    let h = harness();
    let raw = RawSong::from_json(r#"{"id": "x", "url": "https://cdn/x", "duration": 1e30}"#)
        .unwrap();

    h.engine.inject_shared_song(raw).await.unwrap();

    let current = h.engine.current_song().unwrap();
    assert_eq!(current.id, "x");
    assert_eq!(current.duration, None);
}

#[tokio::test]
async fn test_stream_quality_preference_used_for_remote_sources() {
    let h = harness();
    let raw = RawSong::from_json(
        r#"{"id": "q", "downloadUrl": [
            {"quality": "96kbps", "url": "u96"},
            {"quality": "320kbps", "url": "u320"}
        ]}"#,
    )
    .unwrap();
    let track = Song::from_raw(raw).unwrap();

    h.engine.set_stream_quality(StreamQuality::Kbps96).await;
    h.engine.play_song(track.clone()).await.unwrap();
    h.engine.set_stream_quality(StreamQuality::Kbps320).await;
    h.engine.play_song(track).await.unwrap();

    assert_eq!(h.transport.loads(), vec!["u96", "u320"]);
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_repeat_wraps_and_normal_stops_at_end() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b", "c"]), 0);
    h.engine.play_queue_index(2).await.unwrap();

    // normal: no advance
    assert!(!h.engine.next_song().await.unwrap());
    assert_eq!(h.engine.queue_index(), Some(2));

    h.engine.set_playback_mode(PlaybackMode::Repeat);
    assert!(h.engine.next_song().await.unwrap());
    assert_eq!(h.engine.queue_index(), Some(0));

    // and back around
    assert!(h.engine.previous_song().await.unwrap());
    assert_eq!(h.engine.queue_index(), Some(2));
}

#[tokio::test]
async fn test_previous_at_start_in_normal_is_noop() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b"]), 0);
    h.engine.play_queue_index(0).await.unwrap();
    let loads = h.transport.loads().len();

    assert!(!h.engine.previous_song().await.unwrap());
    assert_eq!(h.transport.loads().len(), loads);
    assert_eq!(h.engine.queue_index(), Some(0));
}

#[tokio::test]
async fn test_repeat_one_reloads_same_song() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b", "c"]), 0);
    h.engine.play_queue_index(1).await.unwrap();
    h.engine.set_playback_mode(PlaybackMode::RepeatOne);
    h.transport.set_progress(90_000, TransportState::Playing);
    h.engine.poll_progress().await.unwrap();

    assert!(h.engine.next_song().await.unwrap());
    assert!(h.engine.previous_song().await.unwrap());

    assert_eq!(
        h.transport.loads(),
        vec!["https://cdn/b.mp4", "https://cdn/b.mp4", "https://cdn/b.mp4"]
    );
    assert_eq!(h.engine.current_song().unwrap().id, "b");
    assert_eq!(h.engine.progress().position, Duration::ZERO);
}

#[tokio::test]
async fn test_shuffle_never_picks_current() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b", "c", "d"]), 0);
    h.engine.play_queue_index(0).await.unwrap();
    h.engine.set_playback_mode(PlaybackMode::Shuffle);

    for _ in 0..20 {
        let before = h.engine.queue_index();
        assert!(h.engine.next_song().await.unwrap());
        assert_ne!(h.engine.queue_index(), before);
    }
}

#[tokio::test]
async fn test_mode_cycle_closes() {
    let mut h = harness();
    let start = h.engine.mode();
    let modes: Vec<_> = (0..4).map(|_| h.engine.toggle_playback_mode()).collect();

    assert_eq!(h.engine.mode(), start);
    assert_eq!(
        modes,
        vec![
            PlaybackMode::Repeat,
            PlaybackMode::RepeatOne,
            PlaybackMode::Shuffle,
            PlaybackMode::Normal
        ]
    );
    let names: Vec<_> = playback_events(&mut h.events)
        .into_iter()
        .filter_map(|e| match e {
            PlaybackEvent::ModeChanged { mode } => Some(mode),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["repeat", "repeat_one", "shuffle", "normal"]);
}

// ============================================================================
// Transport control
// ============================================================================

#[tokio::test]
async fn test_toggle_play_pause() {
    let mut h = harness();

    // nothing loaded
    h.engine.toggle_play_pause().await.unwrap();
    assert!(h.transport.calls().is_empty());

    h.engine.play_song(song("a")).await.unwrap();
    drain(&mut h.events);
    h.transport.set_progress(5_000, TransportState::Playing);

    h.engine.toggle_play_pause().await.unwrap();
    assert_eq!(h.transport.calls().last(), Some(&Call::Pause));
    h.engine.toggle_play_pause().await.unwrap();
    assert_eq!(h.transport.calls().last(), Some(&Call::Play));

    assert_eq!(
        playback_events(&mut h.events),
        vec![
            PlaybackEvent::Paused {
                song_id: "a".into(),
                position_ms: 5_000
            },
            PlaybackEvent::Playing {
                song_id: "a".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_seek_gesture_suppresses_polling() {
    let h = harness();
    h.engine.play_song(song("a")).await.unwrap();
    h.transport.set_progress(10_000, TransportState::Playing);
    h.engine.poll_progress().await.unwrap();

    h.engine.begin_seek(Duration::from_secs(60));
    h.transport.set_progress(11_000, TransportState::Playing);
    let snap = h.engine.poll_progress().await.unwrap();
    assert_eq!(snap.position, Duration::from_secs(60));
    assert!(snap.seeking);

    h.engine.update_seek(Duration::from_secs(75));
    assert!(h.engine.end_seek().await.unwrap());
    assert_eq!(
        h.transport.calls().last(),
        Some(&Call::Seek(Duration::from_secs(75)))
    );

    let snap = h.engine.poll_progress().await.unwrap();
    assert!(!snap.seeking);
    assert_eq!(snap.position, Duration::from_secs(75));
}

#[tokio::test]
async fn test_seek_without_song_fails() {
    let h = harness();
    let err = h.engine.seek_to(Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::NoSongLoaded));
}

#[tokio::test]
async fn test_track_end_in_normal_mode_stops_at_last() {
    let mut h = harness();
    h.engine.set_queue(songs(&["a", "b"]), 0);
    h.engine.play_queue_index(1).await.unwrap();
    drain(&mut h.events);

    h.transport.set_progress(180_000, TransportState::Ended);
    h.engine.poll_progress().await.unwrap();

    assert_eq!(h.transport.calls().last(), Some(&Call::Stop));
    assert_eq!(
        playback_events(&mut h.events),
        vec![
            PlaybackEvent::Completed {
                song_id: "b".into()
            },
            PlaybackEvent::Stopped {
                song_id: Some("b".into())
            },
        ]
    );
}

#[tokio::test]
async fn test_track_end_advances_in_normal_mode() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b"]), 0);
    h.engine.play_queue_index(0).await.unwrap();

    h.transport.set_progress(180_000, TransportState::Ended);
    h.engine.poll_progress().await.unwrap();

    assert_eq!(h.engine.current_song().unwrap().id, "b");
}

#[tokio::test]
async fn test_track_end_ignored_after_user_skip() {
    let mut h = harness();
    h.engine.set_queue(songs(&["a", "b", "c"]), 0);
    h.engine.play_queue_index(0).await.unwrap();
    h.transport.set_progress(180_000, TransportState::Ended);
    drain(&mut h.events);

    // the user's skip holds the transport while "b" loads
    let gate = h.transport.hold_next_load();
    let skip = tokio::spawn({
        let engine = h.engine.clone();
        async move { engine.next_song().await }
    });
    h.transport.load_entered.notified().await;

    // the poller saw "a" end and now waits for the transport
    let poll = tokio::spawn({
        let engine = h.engine.clone();
        async move { engine.poll_progress().await }
    });
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    gate.notify_one();
    assert!(skip.await.unwrap().unwrap());
    poll.await.unwrap().unwrap();

    assert_eq!(h.engine.current_song().unwrap().id, "b");
    assert_eq!(h.engine.queue_index(), Some(1));
    assert_eq!(h.transport.loads(), vec!["https://cdn/a.mp4", "https://cdn/b.mp4"]);
    assert!(!playback_events(&mut h.events)
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Completed { .. })));
}

#[tokio::test]
async fn test_remove_from_queue() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b", "c"]), 2);
    assert_eq!(h.engine.remove_from_queue("a").unwrap().id, "a");
    assert_eq!(h.engine.queue_index(), Some(1));
    assert!(h.engine.remove_from_queue("zzz").is_none());
}

#[tokio::test]
async fn test_removing_playing_song_keeps_successor_next() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b", "c"]), 0);
    h.engine.play_queue_index(0).await.unwrap();

    h.engine.remove_from_queue("a");
    assert_eq!(h.engine.current_song().unwrap().id, "a");

    assert!(h.engine.next_song().await.unwrap());
    assert_eq!(h.engine.current_song().unwrap().id, "b");
    assert_eq!(h.engine.queue_index(), Some(0));
}

#[tokio::test]
async fn test_removing_playing_last_song_ends_queue() {
    let h = harness();
    h.engine.set_queue(songs(&["a", "b"]), 0);
    h.engine.play_queue_index(1).await.unwrap();
    h.engine.remove_from_queue("b");

    h.transport.set_progress(180_000, TransportState::Ended);
    h.engine.poll_progress().await.unwrap();

    assert_eq!(h.transport.calls().last(), Some(&Call::Stop));
    assert_eq!(h.transport.loads().len(), 1);
}

#[tokio::test]
async fn test_next_after_set_queue_plays_start_song() {
    let h = harness();
    h.engine.play_song(song("x")).await.unwrap();

    h.engine.set_queue(songs(&["a", "b", "c"]), 0);
    assert_eq!(h.engine.current_song().unwrap().id, "x");

    assert!(h.engine.next_song().await.unwrap());
    assert_eq!(h.engine.current_song().unwrap().id, "a");
    assert_eq!(h.engine.queue_index(), Some(0));
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_toggle_favorite_twice() {
    let mut h = harness();
    assert!(matches!(
        h.engine.toggle_favorite().await,
        Err(PlaybackError::NoSongLoaded)
    ));

    h.engine.play_song(song("a")).await.unwrap();
    drain(&mut h.events);

    assert_eq!(h.engine.toggle_favorite().await.unwrap(), FavoriteAction::Added);
    assert!(h.engine.is_favorite("a"));
    assert_eq!(
        h.store.get(FAVORITES_KEY).await.unwrap().as_deref(),
        Some(r#"["a"]"#)
    );

    assert_eq!(h.engine.toggle_favorite().await.unwrap(), FavoriteAction::Removed);
    assert!(!h.engine.is_favorite("a"));

    let actions: Vec<_> = drain(&mut h.events)
        .into_iter()
        .filter_map(|e| match e {
            CoreEvent::Favorites(FavoritesEvent::Updated { song_id, action }) => {
                Some((song_id, action))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        actions,
        vec![
            ("a".to_string(), FavoriteAction::Added),
            ("a".to_string(), FavoriteAction::Removed)
        ]
    );
}

#[tokio::test]
async fn test_favorite_persistence_failure_is_absorbed() {
    let h = harness();
    h.engine.play_song(song("a")).await.unwrap();
    h.store.set_fail_writes(true);

    assert_eq!(h.engine.toggle_favorite().await.unwrap(), FavoriteAction::Added);
    assert!(h.engine.is_favorite("a"));
}

#[tokio::test]
async fn test_persisted_state_round_trip() {
    let store = Arc::new(MemoryKeyValueStore::new());
    {
        let h = harness_with(EqualizerBridge::unavailable(), store.clone());
        h.engine.play_song(song("a")).await.unwrap();
        h.engine.toggle_favorite().await.unwrap();
        h.engine.apply_eq_profile("Rock").await.unwrap();
        h.engine.set_stream_quality(StreamQuality::Kbps320).await;
    }
    assert!(store.get(SETTINGS_KEY).await.unwrap().is_some());

    let h = harness_with(EqualizerBridge::unavailable(), store);
    h.engine.load_persisted().await;

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.favorites, vec!["a"]);
    assert_eq!(snapshot.eq.profile(), EqProfile::Rock);
    assert_eq!(snapshot.eq.gains(), EqProfile::Rock.preset_gains().unwrap());
    assert_eq!(snapshot.stream_quality, StreamQuality::Kbps320);
    // mode is session-only
    assert_eq!(snapshot.mode, PlaybackMode::Normal);
}

// ============================================================================
// Equalizer
// ============================================================================

#[tokio::test]
async fn test_bass_boost_then_custom_edit() {
    let h = harness();
    let boost = EqProfile::BassBoost.preset_gains().unwrap();

    // module missing: safe no-op reporting failure
    assert!(!h.engine.apply_eq_profile("BassBoost").await.unwrap());
    assert_eq!(h.engine.eq_state().profile(), EqProfile::BassBoost);
    assert_eq!(h.engine.eq_state().gains(), boost);

    h.engine.update_custom_gain(3, -4.0).await.unwrap();
    let state = h.engine.eq_state();
    assert_eq!(state.profile(), EqProfile::Custom);
    for band in 0..8 {
        if band == 3 {
            assert_eq!(state.gains()[band], -4.0);
        } else {
            assert_eq!(state.gains()[band], boost[band]);
        }
    }
}

#[tokio::test]
async fn test_custom_gain_clamped() {
    let h = harness();
    h.engine.update_custom_gain(0, 999.0).await.unwrap();
    assert_eq!(h.engine.eq_state().gains()[0], 12.0);
    h.engine.update_custom_gain(0, -999.0).await.unwrap();
    assert_eq!(h.engine.eq_state().gains()[0], -12.0);
}

#[tokio::test]
async fn test_unknown_profile_rejected() {
    let h = harness();
    let err = h.engine.apply_eq_profile("Dubstep").await.unwrap_err();
    assert!(matches!(err, PlaybackError::Equalizer(_)));
    assert_eq!(h.engine.eq_state().gains(), FLAT);
}

#[tokio::test]
async fn test_gains_reapplied_after_every_load() {
    let boost = EqProfile::BassBoost.preset_gains().unwrap();

    let mut module = MockModule::new();
    module.expect_is_available().times(1).return_const(true);
    module.expect_init().times(2).returning(|_| Ok(()));
    module.expect_set_enabled().times(2).returning(|_| Ok(()));
    // once from apply_eq_profile, once per track load
    module
        .expect_set_gains()
        .withf(move |gains| *gains == boost)
        .times(3)
        .returning(|_| Ok(()));

    let bridge = EqualizerBridge::detect(Arc::new(module)).await;
    let h = harness_with(bridge, Arc::new(MemoryKeyValueStore::new()));

    assert!(h.engine.apply_eq_profile("BassBoost").await.unwrap());
    h.engine.play_song(song("a")).await.unwrap();
    h.engine.play_song(song("b")).await.unwrap();
}

#[tokio::test]
async fn test_gain_drag_commits_once() {
    let mut module = MockModule::new();
    module.expect_is_available().times(1).return_const(true);
    module
        .expect_set_gains()
        .withf(|gains| gains[2] == 5.5)
        .times(1)
        .returning(|_| Ok(()));

    let bridge = EqualizerBridge::detect(Arc::new(module)).await;
    let mut h = harness_with(bridge, Arc::new(MemoryKeyValueStore::new()));

    for value in [1.0, 2.5, 4.0, 5.5] {
        let display = h.engine.preview_custom_gain(2, value).unwrap();
        assert_eq!(display[2], value);
    }
    // committed state untouched while dragging
    assert_eq!(h.engine.eq_state().gains()[2], 0.0);
    assert_eq!(h.engine.display_gains()[2], 5.5);

    assert_eq!(h.engine.commit_custom_gain().await.unwrap(), Some(true));
    assert_eq!(h.engine.eq_state().gains()[2], 5.5);
    assert_eq!(h.engine.eq_state().profile(), EqProfile::Custom);
    assert_eq!(h.engine.commit_custom_gain().await.unwrap(), None);

    let gain_events: Vec<_> = drain(&mut h.events)
        .into_iter()
        .filter(|e| matches!(e, CoreEvent::Equalizer(EqualizerEvent::GainChanged { .. })))
        .collect();
    assert_eq!(gain_events.len(), 1);
}
