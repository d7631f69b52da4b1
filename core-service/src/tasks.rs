//! Background loops owned by [`PlayerCore`](crate::PlayerCore).
//!
//! Both loops exit when their cancellation token fires.

use bridge_traits::LyricsQuery;
use core_lyrics::{LyricsSession, LyricsStatus};
use core_playback::{PlayerEngine, ProgressSnapshot, Song};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Poll the transport at `period` and feed the engine.
pub(crate) async fn run_progress_poller(
    engine: Arc<PlayerEngine>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Progress poller stopped");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = engine.poll_progress().await {
                    trace!(error = %e, "Progress poll failed");
                }
            }
        }
    }
}

/// Follow the engine's current song and position and keep lyrics in step.
///
/// Lookups run on their own task so a slow provider never delays position
/// updates. A song change aborts the lookup still in flight.
pub(crate) async fn run_lyrics_driver(
    mut current: watch::Receiver<Option<Song>>,
    mut progress: watch::Receiver<ProgressSnapshot>,
    lyrics: Arc<LyricsSession>,
    cancel: CancellationToken,
) {
    let mut in_flight: Option<JoinHandle<()>> = None;
    let mut requested: Option<String> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Lyrics driver stopped");
                break;
            }
            changed = current.changed() => {
                if changed.is_err() {
                    break;
                }
                let song = current.borrow_and_update().clone();
                match song {
                    Some(song) if needs_lookup(&lyrics, requested.as_deref(), &song) => {
                        if let Some(handle) = in_flight.take() {
                            handle.abort();
                        }
                        requested = Some(song.id.clone());
                        in_flight = Some(spawn_lookup(lyrics.clone(), lyrics_query(&song)));
                    }
                    Some(_) => {}
                    None => {
                        if let Some(handle) = in_flight.take() {
                            handle.abort();
                        }
                        requested = None;
                        lyrics.clear();
                    }
                }
            }
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
                let position = progress.borrow_and_update().position_secs();
                lyrics.update_position(position);
            }
        }
    }

    if let Some(handle) = in_flight {
        handle.abort();
    }
}

// Replaying the same song keeps its document unless the last lookup failed.
fn needs_lookup(lyrics: &LyricsSession, requested: Option<&str>, song: &Song) -> bool {
    if requested != Some(song.id.as_str()) {
        return true;
    }
    let view = lyrics.view();
    view.song_id.as_deref() == Some(song.id.as_str()) && view.status == LyricsStatus::Failed
}

fn spawn_lookup(lyrics: Arc<LyricsSession>, query: LyricsQuery) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = lyrics.load_for_song(query).await;
        trace!(?outcome, "Lyrics lookup finished");
    })
}

pub(crate) fn lyrics_query(song: &Song) -> LyricsQuery {
    let query = LyricsQuery::new(&song.id, &song.title, &song.subtitle);
    match song.duration {
        Some(duration) => query.with_duration(duration.as_secs() as u32),
        None => query,
    }
}
