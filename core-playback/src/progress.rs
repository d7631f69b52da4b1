//! Playback position as seen by the UI.
//!
//! The transport is polled at a fixed interval and each sample is folded in
//! here. While a seek gesture is active the displayed position follows the
//! gesture and polled positions are ignored; duration and state still update.

use bridge_traits::{TransportProgress, TransportState};
use std::time::Duration;

/// What the player screen renders.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSnapshot {
    pub position: Duration,
    pub duration: Duration,
    pub state: TransportState,
    /// A seek gesture owns `position`.
    pub seeking: bool,
}

impl ProgressSnapshot {
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn position_secs(&self) -> f64 {
        self.position.as_secs_f64()
    }

    /// Fraction played in `[0, 1]`; zero while the duration is unknown.
    pub fn fraction(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Result of folding one transport sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub snapshot: ProgressSnapshot,
    /// The transport just reported the end of the track.
    pub finished: bool,
}

#[derive(Debug, Default, Clone)]
pub struct ProgressTracker {
    last: TransportProgress,
    seek: Option<Duration>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeking(&self) -> bool {
        self.seek.is_some()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            position: self.seek.unwrap_or(self.last.position),
            duration: self.last.duration,
            state: self.last.state,
            seeking: self.seek.is_some(),
        }
    }

    /// Fold a polled sample. `finished` fires once per transition into `Ended`.
    pub fn observe(&mut self, sample: TransportProgress) -> Observation {
        let finished =
            sample.state == TransportState::Ended && self.last.state != TransportState::Ended;
        self.last = sample;
        Observation {
            snapshot: self.snapshot(),
            finished,
        }
    }

    pub fn begin_seek(&mut self, position: Duration) -> ProgressSnapshot {
        self.seek = Some(self.clamp(position));
        self.snapshot()
    }

    /// Move the gesture. Ignored when no gesture is active.
    pub fn update_seek(&mut self, position: Duration) -> Option<ProgressSnapshot> {
        let clamped = self.clamp(position);
        let seek = self.seek.as_mut()?;
        *seek = clamped;
        Some(self.snapshot())
    }

    /// End the gesture, returning the position to commit.
    pub fn end_seek(&mut self) -> Option<Duration> {
        let target = self.seek.take()?;
        self.last.position = target;
        Some(target)
    }

    pub fn cancel_seek(&mut self) {
        self.seek = None;
    }

    /// Forget the previous track.
    pub fn reset(&mut self, state: TransportState) {
        self.last = TransportProgress {
            state,
            ..TransportProgress::default()
        };
        self.seek = None;
    }

    pub fn set_position(&mut self, position: Duration) {
        self.last.position = position;
    }

    fn clamp(&self, position: Duration) -> Duration {
        if self.last.duration.is_zero() {
            position
        } else {
            position.min(self.last.duration)
        }
    }
}
