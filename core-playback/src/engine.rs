//! # Player Engine
//!
//! Single owner of what is playing, from where, in what order.
//!
//! ## State
//!
//! Queue, loaded song, mode, favorites, equalizer state and the progress
//! tracker live behind one `parking_lot` mutex that is never held across an
//! `.await`. Transport calls go through a separate `tokio` mutex so song
//! changes reach the native player strictly in order.
//!
//! ## Publishing
//!
//! - current song and progress on `watch` channels (latest value wins)
//! - discrete changes as [`CoreEvent`]s on the shared [`EventBus`]
//!
//! ## Failure handling
//!
//! A source that fails to load is reported with
//! [`PlaybackEvent::LoadFailed`] and an `Err` from the call that triggered
//! it. The queue cursor and current song are left as they were.

use bridge_traits::{BandGains, KeyValueStore, TrackTransport, TransportProgress, TransportState};
use core_equalizer::{EqState, EqualizerBridge, GainDrag};
use core_runtime::config::FeatureFlags;
use core_runtime::events::{
    CoreEvent, EqualizerEvent, EventBus, FavoriteAction, FavoritesEvent, PlaybackEvent,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, info, instrument, warn};

use crate::error::{PlaybackError, Result};
use crate::favorites::Favorites;
use crate::mode::PlaybackMode;
use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::queue::Queue;
use crate::settings::PlayerSettings;
use crate::song::{RawSong, Song, StreamQuality};

/// Point-in-time view of the engine for hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub current_song: Option<Song>,
    pub queue_len: usize,
    pub queue_index: Option<usize>,
    pub mode: PlaybackMode,
    pub eq: EqState,
    /// Committed gains with any in-progress slider drag overlaid.
    pub display_gains: BandGains,
    pub favorites: Vec<String>,
    pub stream_quality: StreamQuality,
    pub progress: ProgressSnapshot,
}

struct EngineState {
    queue: Queue,
    current: Option<Song>,
    mode: PlaybackMode,
    favorites: Favorites,
    eq: EqState,
    drag: GainDrag,
    stream_quality: StreamQuality,
    progress: ProgressTracker,
    /// Bumped on every successful load; stale progress samples are dropped.
    load_generation: u64,
    rng: StdRng,
}

impl EngineState {
    fn settings(&self) -> PlayerSettings {
        PlayerSettings {
            stream_quality: self.stream_quality,
            ..PlayerSettings::default()
        }
        .with_eq_state(&self.eq)
    }
}

pub struct PlayerEngine {
    transport: Arc<dyn TrackTransport>,
    equalizer: Arc<EqualizerBridge>,
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
    features: FeatureFlags,
    state: Mutex<EngineState>,
    transport_lock: AsyncMutex<()>,
    persist_lock: AsyncMutex<()>,
    current_tx: watch::Sender<Option<Song>>,
    progress_tx: watch::Sender<ProgressSnapshot>,
}

impl PlayerEngine {
    pub fn new(
        transport: Arc<dyn TrackTransport>,
        equalizer: Arc<EqualizerBridge>,
        store: Arc<dyn KeyValueStore>,
        events: EventBus,
        features: FeatureFlags,
    ) -> Self {
        let (current_tx, _) = watch::channel(None);
        let (progress_tx, _) = watch::channel(ProgressSnapshot::default());

        Self {
            transport,
            equalizer,
            store,
            events,
            features,
            state: Mutex::new(EngineState {
                queue: Queue::new(),
                current: None,
                mode: PlaybackMode::default(),
                favorites: Favorites::new(),
                eq: EqState::new(),
                drag: GainDrag::new(),
                stream_quality: StreamQuality::default(),
                progress: ProgressTracker::new(),
                load_generation: 0,
                rng: StdRng::from_entropy(),
            }),
            transport_lock: AsyncMutex::new(()),
            persist_lock: AsyncMutex::new(()),
            current_tx,
            progress_tx,
        }
    }

    /// Deterministic shuffle for tests and replays.
    pub fn with_seed(self, seed: u64) -> Self {
        self.state.lock().rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Restore favorites and player settings from the store.
    pub async fn load_persisted(&self) {
        let favorites = if self.features.persist_favorites {
            Favorites::load(self.store.as_ref()).await
        } else {
            Favorites::new()
        };
        let settings = PlayerSettings::load(self.store.as_ref()).await;

        let mut state = self.state.lock();
        debug!(
            favorites = favorites.len(),
            eq_profile = %settings.eq_profile,
            stream_quality = settings.stream_quality.kbps(),
            "Restored player state"
        );
        state.favorites = favorites;
        state.eq = settings.eq_state();
        state.stream_quality = settings.stream_quality;
    }

    fn emit(&self, event: CoreEvent) {
        let _ = self.events.emit(event);
    }

    fn publish_progress(&self, snapshot: ProgressSnapshot) {
        self.progress_tx.send_replace(snapshot);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load `song` into the transport and start it.
    ///
    /// Must be called with `transport_lock` held. `queue_index` is the slot
    /// being played; `None` means "find it, or insert it after the cursor".
    async fn load_and_play(&self, song: Song, queue_index: Option<usize>) -> Result<()> {
        let quality = self.state.lock().stream_quality;

        let Some(source) = song.playback_source(quality) else {
            let err = PlaybackError::NoPlayableSource(song.id.clone());
            self.report_load_failure(&song, &err);
            return Err(err);
        };

        debug!(
            song_id = %song.id,
            local = source.is_local(),
            "Loading track"
        );

        if let Err(e) = self.transport.load(source, song.metadata()).await {
            let err = PlaybackError::LoadFailed {
                song_id: song.id.clone(),
                message: e.to_string(),
            };
            self.report_load_failure(&song, &err);
            return Err(err);
        }

        // native effects are rebuilt per track
        if self.features.enable_equalizer && self.equalizer.is_available() {
            let session_id = match self.transport.audio_session_id().await {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, "Could not read audio session id");
                    None
                }
            };
            let gains = self.state.lock().eq.gains();
            self.equalizer.reapply(session_id, gains).await;
        }

        if let Err(e) = self.transport.play().await {
            let err = PlaybackError::LoadFailed {
                song_id: song.id.clone(),
                message: e.to_string(),
            };
            self.report_load_failure(&song, &err);
            return Err(err);
        }

        let (queue_index, queue_len, progress) = {
            let mut state = self.state.lock();
            let slot_matches = |i: usize| state.queue.get(i).is_some_and(|s| s.id == song.id);
            let index = match queue_index.filter(|&i| slot_matches(i)) {
                Some(index) => index,
                None => match state.queue.position_of(&song.id) {
                    Some(index) => index,
                    None => state.queue.insert_after_current(song.clone()),
                },
            };
            state.queue.select(index);
            state.current = Some(song.clone());
            state.load_generation += 1;
            state.progress.reset(TransportState::Playing);
            if let Some(duration) = song.duration {
                state.progress.observe(TransportProgress {
                    position: Duration::ZERO,
                    duration,
                    state: TransportState::Playing,
                });
            }
            (state.queue.cursor(), state.queue.len(), state.progress.snapshot())
        };

        info!(song_id = %song.id, ?queue_index, "Track changed");
        self.current_tx.send_replace(Some(song.clone()));
        self.publish_progress(progress);
        self.emit(CoreEvent::Playback(PlaybackEvent::TrackChanged {
            song_id: song.id.clone(),
            title: song.title.clone(),
            queue_index,
        }));
        self.emit(CoreEvent::Playback(PlaybackEvent::QueueChanged {
            length: queue_len,
            current_index: queue_index,
        }));
        self.emit(CoreEvent::Playback(PlaybackEvent::Playing { song_id: song.id }));
        Ok(())
    }

    fn report_load_failure(&self, song: &Song, err: &PlaybackError) {
        warn!(song_id = %song.id, error = %err, "Track failed to load");
        self.emit(CoreEvent::Playback(PlaybackEvent::LoadFailed {
            song_id: song.id.clone(),
            message: err.to_string(),
            recoverable: err.is_transient(),
        }));
    }

    // ========================================================================
    // Queue and transport control
    // ========================================================================

    /// Play a song, preferring its local file. A song missing from the
    /// queue is inserted right after the cursor.
    #[instrument(skip(self, song), fields(song_id = %song.id))]
    pub async fn play_song(&self, song: Song) -> Result<()> {
        let _guard = self.transport_lock.lock().await;
        self.load_and_play(song, None).await
    }

    /// Play the song at `index` in the queue.
    pub async fn play_queue_index(&self, index: usize) -> Result<()> {
        let _guard = self.transport_lock.lock().await;
        let song = {
            let state = self.state.lock();
            state
                .queue
                .get(index)
                .cloned()
                .ok_or(PlaybackError::IndexOutOfRange {
                    index,
                    len: state.queue.len(),
                })?
        };
        self.load_and_play(song, Some(index)).await
    }

    /// Play a song shared from another device (NFC payload).
    pub async fn inject_shared_song(&self, raw: RawSong) -> Result<()> {
        let song = Song::from_raw(raw)?;
        info!(song_id = %song.id, "Playing shared song");
        self.play_song(song).await
    }

    /// Replace the queue. Does not start playback.
    ///
    /// The loaded song keeps playing; the next skip plays `start_index`.
    pub fn set_queue(&self, songs: Vec<Song>, start_index: usize) {
        let (length, current_index) = {
            let mut state = self.state.lock();
            state.queue.replace(songs, Some(start_index));
            (state.queue.len(), state.queue.cursor())
        };
        debug!(length, ?current_index, "Queue replaced");
        self.emit(CoreEvent::Playback(PlaybackEvent::QueueChanged {
            length,
            current_index,
        }));
    }

    /// Drop a song from the queue (e.g. its download was deleted).
    ///
    /// Removing the loaded song keeps it playing; the next skip plays the
    /// song that took its slot.
    pub fn remove_from_queue(&self, song_id: &str) -> Option<Song> {
        let (removed, length, current_index) = {
            let mut state = self.state.lock();
            let removed = state.queue.remove(song_id);
            (removed, state.queue.len(), state.queue.cursor())
        };
        if removed.is_some() {
            self.emit(CoreEvent::Playback(PlaybackEvent::QueueChanged {
                length,
                current_index,
            }));
        }
        removed
    }

    /// Pause when playing, resume otherwise. No-op without a loaded song.
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let _guard = self.transport_lock.lock().await;
        let Some(song_id) = self.current_song_id() else {
            debug!("Play/pause ignored, nothing loaded");
            return Ok(());
        };

        let progress = self.transport.progress().await?;
        if progress.is_playing() {
            self.transport.pause().await?;
            let snapshot = {
                let mut state = self.state.lock();
                state.progress.observe(TransportProgress {
                    state: TransportState::Paused,
                    ..progress
                });
                state.progress.snapshot()
            };
            self.publish_progress(snapshot);
            self.emit(CoreEvent::Playback(PlaybackEvent::Paused {
                song_id,
                position_ms: progress.position.as_millis() as u64,
            }));
        } else {
            self.transport.play().await?;
            let snapshot = {
                let mut state = self.state.lock();
                state.progress.observe(TransportProgress {
                    state: TransportState::Playing,
                    ..progress
                });
                state.progress.snapshot()
            };
            self.publish_progress(snapshot);
            self.emit(CoreEvent::Playback(PlaybackEvent::Playing { song_id }));
        }
        Ok(())
    }

    /// Advance per the current mode. Returns `false` when there is nowhere to go.
    pub async fn next_song(&self) -> Result<bool> {
        let _guard = self.transport_lock.lock().await;
        let target = {
            let mut state = self.state.lock();
            let EngineState {
                queue, mode, rng, ..
            } = &mut *state;
            queue
                .next_index(*mode, rng)
                .and_then(|i| queue.get(i).cloned().map(|song| (i, song)))
        };
        self.play_target(target).await
    }

    /// Step back per the current mode. Returns `false` when there is nowhere to go.
    pub async fn previous_song(&self) -> Result<bool> {
        let _guard = self.transport_lock.lock().await;
        let target = {
            let mut state = self.state.lock();
            let EngineState {
                queue, mode, rng, ..
            } = &mut *state;
            queue
                .previous_index(*mode, rng)
                .and_then(|i| queue.get(i).cloned().map(|song| (i, song)))
        };
        self.play_target(target).await
    }

    async fn play_target(&self, target: Option<(usize, Song)>) -> Result<bool> {
        match target {
            Some((index, song)) => {
                self.load_and_play(song, Some(index)).await?;
                Ok(true)
            }
            None => {
                debug!("No track to move to");
                Ok(false)
            }
        }
    }

    /// Auto-advance after the transport reports the end of a track.
    ///
    /// Normal mode stops at the end of the queue; the other modes keep going.
    pub async fn handle_track_finished(&self) -> Result<()> {
        let _guard = self.transport_lock.lock().await;
        self.finish_track_locked(None).await
    }

    /// Must be called with `transport_lock` held. With `Some(generation)`,
    /// a track loaded since the end was observed cancels the advance.
    async fn finish_track_locked(&self, observed: Option<u64>) -> Result<()> {
        let (finished, target) = {
            let mut state = self.state.lock();
            if observed.is_some_and(|g| g != state.load_generation) {
                debug!("Track changed before end-of-track handling, skipping advance");
                return Ok(());
            }
            let finished = state.current.as_ref().map(|s| s.id.clone());
            let EngineState {
                queue, mode, rng, ..
            } = &mut *state;
            let target = queue
                .next_index(*mode, rng)
                .and_then(|i| queue.get(i).cloned().map(|song| (i, song)));
            (finished, target)
        };

        if let Some(song_id) = finished {
            self.emit(CoreEvent::Playback(PlaybackEvent::Completed { song_id }));
        }

        if target.is_some() {
            self.play_target(target).await?;
        } else {
            info!("End of queue");
            self.stop_locked().await?;
        }
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        let _guard = self.transport_lock.lock().await;
        self.stop_locked().await
    }

    async fn stop_locked(&self) -> Result<()> {
        self.transport.stop().await?;
        let (song_id, snapshot) = {
            let mut state = self.state.lock();
            state.progress.reset(TransportState::Stopped);
            (
                state.current.as_ref().map(|s| s.id.clone()),
                state.progress.snapshot(),
            )
        };
        self.publish_progress(snapshot);
        self.emit(CoreEvent::Playback(PlaybackEvent::Stopped { song_id }));
        Ok(())
    }

    // ========================================================================
    // Seeking
    // ========================================================================

    /// Jump to `position` in the loaded track.
    pub async fn seek_to(&self, position: Duration) -> Result<()> {
        let _guard = self.transport_lock.lock().await;
        let song_id = self.current_song_id().ok_or(PlaybackError::NoSongLoaded)?;

        self.transport.seek_to(position).await?;
        let snapshot = {
            let mut state = self.state.lock();
            state.progress.cancel_seek();
            state.progress.set_position(position);
            state.progress.snapshot()
        };
        self.publish_progress(snapshot);
        self.emit(CoreEvent::Playback(PlaybackEvent::Seeked {
            song_id,
            position_ms: position.as_millis() as u64,
        }));
        Ok(())
    }

    /// Start a seek gesture. Polled positions are ignored until it ends.
    pub fn begin_seek(&self, position: Duration) -> ProgressSnapshot {
        let snapshot = self.state.lock().progress.begin_seek(position);
        self.publish_progress(snapshot);
        snapshot
    }

    pub fn update_seek(&self, position: Duration) -> Option<ProgressSnapshot> {
        let snapshot = self.state.lock().progress.update_seek(position)?;
        self.publish_progress(snapshot);
        Some(snapshot)
    }

    /// Finish the gesture and commit the seek. `Ok(false)` without a gesture.
    pub async fn end_seek(&self) -> Result<bool> {
        let target = self.state.lock().progress.end_seek();
        match target {
            Some(position) => {
                self.seek_to(position).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn cancel_seek(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            state.progress.cancel_seek();
            state.progress.snapshot()
        };
        self.publish_progress(snapshot);
    }

    /// Read the transport once and publish the result.
    ///
    /// Samples read across a track change are dropped. When the transport
    /// reports the end of the track the engine auto-advances.
    pub async fn poll_progress(&self) -> Result<ProgressSnapshot> {
        let generation = self.state.lock().load_generation;
        let sample = self.transport.progress().await?;

        let observation = {
            let mut state = self.state.lock();
            if state.load_generation != generation || state.current.is_none() {
                return Ok(state.progress.snapshot());
            }
            state.progress.observe(sample)
        };
        self.publish_progress(observation.snapshot);

        if observation.finished {
            let _guard = self.transport_lock.lock().await;
            self.finish_track_locked(Some(generation)).await?;
        }
        Ok(observation.snapshot)
    }

    // ========================================================================
    // Mode and favorites
    // ========================================================================

    pub fn toggle_playback_mode(&self) -> PlaybackMode {
        let mode = {
            let mut state = self.state.lock();
            state.mode = state.mode.cycled();
            state.mode
        };
        info!(%mode, "Playback mode changed");
        self.emit(CoreEvent::Playback(PlaybackEvent::ModeChanged {
            mode: mode.as_str().to_string(),
        }));
        mode
    }

    pub fn set_playback_mode(&self, mode: PlaybackMode) {
        let changed = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.mode, mode) != mode
        };
        if changed {
            self.emit(CoreEvent::Playback(PlaybackEvent::ModeChanged {
                mode: mode.as_str().to_string(),
            }));
        }
    }

    /// Toggle the current song's favorite membership.
    pub async fn toggle_favorite(&self) -> Result<FavoriteAction> {
        let song_id = self.current_song_id().ok_or(PlaybackError::NoSongLoaded)?;
        let action = self.state.lock().favorites.toggle(&song_id);

        debug!(song_id = %song_id, ?action, "Favorite toggled");
        self.emit(CoreEvent::Favorites(FavoritesEvent::Updated {
            song_id,
            action,
        }));

        if self.features.persist_favorites {
            let _persist = self.persist_lock.lock().await;
            let favorites = self.state.lock().favorites.clone();
            favorites.save(self.store.as_ref()).await;
        }
        Ok(action)
    }

    pub fn is_favorite(&self, song_id: &str) -> bool {
        self.state.lock().favorites.contains(song_id)
    }

    pub fn favorites(&self) -> Vec<String> {
        self.state.lock().favorites.ids().to_vec()
    }

    // ========================================================================
    // Equalizer
    // ========================================================================

    async fn push_gains(&self, gains: BandGains) -> bool {
        self.features.enable_equalizer && self.equalizer.set_gains(gains).await
    }

    /// Select a preset by name. Returns whether the native module took the gains.
    pub async fn apply_eq_profile(&self, name: &str) -> Result<bool> {
        let (profile, gains) = {
            let mut state = self.state.lock();
            let gains = state.eq.apply_profile_name(name)?;
            state.drag.cancel();
            (state.eq.profile(), gains)
        };

        let applied = self.push_gains(gains).await;
        info!(%profile, applied, "Equalizer profile applied");
        self.emit(CoreEvent::Equalizer(EqualizerEvent::ProfileApplied {
            profile: profile.name().to_string(),
            gains: gains.to_vec(),
            applied,
        }));
        self.persist_settings().await;
        Ok(applied)
    }

    /// Edit one band; the profile becomes `Custom`.
    pub async fn update_custom_gain(&self, index: usize, value: f32) -> Result<bool> {
        let (gain, gains) = {
            let mut state = self.state.lock();
            let gain = state.eq.update_custom_gain(index, value)?;
            (gain, state.eq.gains())
        };

        let applied = self.push_gains(gains).await;
        self.emit(CoreEvent::Equalizer(EqualizerEvent::GainChanged {
            band: index,
            gain,
            applied,
        }));
        self.persist_settings().await;
        Ok(applied)
    }

    /// Slider moved: update the displayed gains only.
    pub fn preview_custom_gain(&self, index: usize, value: f32) -> Result<BandGains> {
        let mut state = self.state.lock();
        state.drag.update(index, value)?;
        Ok(state.drag.display_gains(state.eq.gains()))
    }

    /// Slider released: commit the dragged value once. `Ok(None)` without a drag.
    pub async fn commit_custom_gain(&self) -> Result<Option<bool>> {
        let finished = self.state.lock().drag.finish();
        match finished {
            Some((band, value)) => Ok(Some(self.update_custom_gain(band, value).await?)),
            None => Ok(None),
        }
    }

    pub fn cancel_custom_gain(&self) {
        self.state.lock().drag.cancel();
    }

    pub fn eq_state(&self) -> EqState {
        self.state.lock().eq
    }

    pub fn display_gains(&self) -> BandGains {
        let state = self.state.lock();
        state.drag.display_gains(state.eq.gains())
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn set_stream_quality(&self, quality: StreamQuality) {
        self.state.lock().stream_quality = quality;
        self.persist_settings().await;
    }

    pub fn stream_quality(&self) -> StreamQuality {
        self.state.lock().stream_quality
    }

    async fn persist_settings(&self) {
        let _persist = self.persist_lock.lock().await;
        let settings = self.state.lock().settings();
        settings.save(self.store.as_ref()).await;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_song(&self) -> Option<Song> {
        self.state.lock().current.clone()
    }

    fn current_song_id(&self) -> Option<String> {
        self.state.lock().current.as_ref().map(|s| s.id.clone())
    }

    pub fn queue(&self) -> Vec<Song> {
        self.state.lock().queue.songs().to_vec()
    }

    pub fn queue_index(&self) -> Option<usize> {
        self.state.lock().queue.cursor()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.state.lock().mode
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.state.lock().progress.snapshot()
    }

    pub fn subscribe_current_song(&self) -> watch::Receiver<Option<Song>> {
        self.current_tx.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    pub fn equalizer(&self) -> &EqualizerBridge {
        &self.equalizer
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.lock();
        EngineSnapshot {
            current_song: state.current.clone(),
            queue_len: state.queue.len(),
            queue_index: state.queue.cursor(),
            mode: state.mode,
            eq: state.eq,
            display_gains: state.drag.display_gains(state.eq.gains()),
            favorites: state.favorites.ids().to_vec(),
            stream_quality: state.stream_quality,
            progress: state.progress.snapshot(),
        }
    }
}

impl std::fmt::Debug for PlayerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerEngine")
            .field("features", &self.features)
            .field("equalizer", &self.equalizer)
            .finish_non_exhaustive()
    }
}
