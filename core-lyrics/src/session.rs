//! Per-song lyrics lookup and active-line state.
//!
//! Every song change bumps a generation counter. Each suspension point of
//! a lookup (cache read, provider fetch, backoff sleep) re-checks the
//! generation it started with, and a result from an older generation is
//! dropped without touching the visible state or the cache.

use bridge_traits::{LyricsProvider, LyricsQuery};
use core_runtime::config::RetryPolicy;
use core_runtime::events::{CoreEvent, EventBus, LyricsEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cache::LyricsCache;
use crate::error::LyricsError;
use crate::parser::{parse_raw_lyrics, LyricsDocument};
use crate::tracker::ActiveLineTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LyricsStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    NotFound,
    Failed,
}

/// Result of [`LyricsSession::load_for_song`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { from_cache: bool },
    NotFound,
    Failed,
    /// The song changed before the lookup finished; nothing was applied.
    Stale,
}

/// Snapshot of what the lyrics panel should show.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LyricsView {
    pub song_id: Option<String>,
    pub status: LyricsStatus,
    pub document: LyricsDocument,
    pub active_index: Option<usize>,
}

impl LyricsView {
    pub fn is_synced(&self) -> bool {
        self.document.is_synced()
    }

    /// Nothing to display; the host shows its placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.document.is_empty()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    song_id: Option<String>,
    status: LyricsStatus,
    document: LyricsDocument,
    tracker: ActiveLineTracker,
}

pub struct LyricsSession {
    cache: LyricsCache,
    provider: Option<Arc<dyn LyricsProvider>>,
    events: EventBus,
    retry: RetryPolicy,
    generation: AtomicU64,
    state: Mutex<SessionState>,
}

impl LyricsSession {
    pub fn new(
        cache: LyricsCache,
        provider: Option<Arc<dyn LyricsProvider>>,
        events: EventBus,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            cache,
            provider,
            events,
            retry,
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn cache(&self) -> &LyricsCache {
        &self.cache
    }

    pub fn view(&self) -> LyricsView {
        let state = self.state.lock();
        LyricsView {
            song_id: state.song_id.clone(),
            status: state.status,
            document: state.document.clone(),
            active_index: state.tracker.current(),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn emit(&self, event: LyricsEvent) {
        let _ = self.events.emit(CoreEvent::Lyrics(event));
    }

    /// Forget the current song and invalidate in-flight lookups.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = SessionState::default();
    }

    /// Look up lyrics for a newly selected song: cache first, then provider.
    ///
    /// Errors never escape; they leave an empty document with
    /// [`LyricsStatus::Failed`].
    #[instrument(skip(self, query), fields(song_id = %query.song_id))]
    pub async fn load_for_song(&self, query: LyricsQuery) -> LoadOutcome {
        let generation = {
            let mut state = self.state.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = SessionState {
                song_id: Some(query.song_id.clone()),
                status: LyricsStatus::Loading,
                ..SessionState::default()
            };
            generation
        };
        self.emit(LyricsEvent::Loading {
            song_id: query.song_id.clone(),
        });

        if let Some(entry) = self.cache.get(&query.song_id).await {
            let document = entry.document();
            if !self.is_current(generation) {
                debug!("Song changed during cache read, discarding");
                return LoadOutcome::Stale;
            }
            if !document.is_empty() {
                return self.install(generation, &query.song_id, document, true);
            }
            debug!("Cached entry is empty, falling through to provider");
        }

        let Some(provider) = self.provider.clone() else {
            return self.finish_empty(generation, &query.song_id, LyricsStatus::NotFound);
        };

        let fetched = match self.fetch_with_retry(provider.as_ref(), &query, generation).await {
            Some(result) => result,
            None => return LoadOutcome::Stale,
        };

        if !self.is_current(generation) {
            debug!("Song changed during fetch, discarding");
            return LoadOutcome::Stale;
        }

        match fetched {
            Ok(Some(fetched)) => {
                let document = parse_raw_lyrics(&fetched.lyrics);
                if document.is_empty() {
                    return self.finish_empty(generation, &query.song_id, LyricsStatus::NotFound);
                }
                if fetched.is_synced != document.is_synced() {
                    debug!(
                        provider_synced = fetched.is_synced,
                        parsed_synced = document.is_synced(),
                        "Provider sync flag disagrees with parsed lyrics"
                    );
                }

                self.cache
                    .store(&query.song_id, &document, &query.name, &query.subtitle)
                    .await;
                if !self.is_current(generation) {
                    debug!("Song changed during cache write, discarding");
                    return LoadOutcome::Stale;
                }
                self.install(generation, &query.song_id, document, false)
            }
            Ok(None) => self.finish_empty(generation, &query.song_id, LyricsStatus::NotFound),
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Lyrics lookup failed");
                let outcome = self.finish_empty(generation, &query.song_id, LyricsStatus::Failed);
                if outcome == LoadOutcome::Failed {
                    self.emit(LyricsEvent::Failed {
                        song_id: query.song_id.clone(),
                        message: e.to_string(),
                    });
                }
                outcome
            }
        }
    }

    /// Provider fetch with exponential backoff. `None` when the song changed
    /// while waiting.
    async fn fetch_with_retry(
        &self,
        provider: &dyn LyricsProvider,
        query: &LyricsQuery,
        generation: u64,
    ) -> Option<Result<Option<bridge_traits::FetchedLyrics>, LyricsError>> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match provider.fetch(query).await {
                Ok(found) => return Some(Ok(found)),
                Err(e) if attempt + 1 >= attempts || e.is_not_available() => {
                    return Some(Err(LyricsError::Provider(e.to_string())));
                }
                Err(e) => {
                    let delay = self.retry.delay_for(attempt);
                    debug!(
                        provider = provider.name(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Lyrics fetch failed, retrying"
                    );
                    attempt += 1;
                    if !self.is_current(generation) {
                        return None;
                    }
                    tokio::time::sleep(delay).await;
                    if !self.is_current(generation) {
                        return None;
                    }
                }
            }
        }
    }

    fn install(
        &self,
        generation: u64,
        song_id: &str,
        document: LyricsDocument,
        from_cache: bool,
    ) -> LoadOutcome {
        let line_count = document.len();
        let synced = document.is_synced();
        {
            let mut state = self.state.lock();
            if !self.is_current(generation) {
                return LoadOutcome::Stale;
            }
            state.tracker = ActiveLineTracker::for_document(&document);
            state.document = document;
            state.status = LyricsStatus::Ready;
        }

        info!(song_id, synced, line_count, from_cache, "Lyrics ready");
        self.emit(LyricsEvent::Loaded {
            song_id: song_id.to_string(),
            synced,
            line_count,
            from_cache,
        });
        LoadOutcome::Loaded { from_cache }
    }

    fn finish_empty(&self, generation: u64, song_id: &str, status: LyricsStatus) -> LoadOutcome {
        {
            let mut state = self.state.lock();
            if !self.is_current(generation) {
                return LoadOutcome::Stale;
            }
            state.document = LyricsDocument::empty();
            state.tracker = ActiveLineTracker::default();
            state.status = status;
        }

        if status == LyricsStatus::NotFound {
            debug!(song_id, "No lyrics available");
            self.emit(LyricsEvent::Unavailable {
                song_id: song_id.to_string(),
            });
            LoadOutcome::NotFound
        } else {
            LoadOutcome::Failed
        }
    }

    /// Feed a playback position in seconds. Emits only when the active line changes.
    pub fn update_position(&self, position_secs: f64) -> Option<usize> {
        let (song_id, index) = {
            let mut state = self.state.lock();
            if state.status != LyricsStatus::Ready || !state.tracker.update(position_secs) {
                return state.tracker.current();
            }
            (state.song_id.clone(), state.tracker.current())
        };

        if let Some(song_id) = song_id {
            self.emit(LyricsEvent::ActiveLineChanged { song_id, index });
        }
        index
    }
}

impl std::fmt::Debug for LyricsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricsSession")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
