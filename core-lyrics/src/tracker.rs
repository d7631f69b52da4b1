//! Active lyric line resolution.

use crate::parser::{LyricsDocument, TimedLine};

/// Index of the line active at `position` seconds.
///
/// The active line is the last one whose timestamp is `<= position`.
/// Returns `None` for empty input, a position before the first timestamp,
/// or a NaN position. Lines must be sorted by time.
pub fn resolve_active_line(lines: &[TimedLine], position: f64) -> Option<usize> {
    if position.is_nan() {
        return None;
    }
    let passed = lines.partition_point(|line| line.time <= position);
    passed.checked_sub(1)
}

/// Tracks the active line across position updates and reports only changes.
#[derive(Debug, Clone, Default)]
pub struct ActiveLineTracker {
    times: Vec<f64>,
    current: Option<usize>,
}

impl ActiveLineTracker {
    /// Tracker for `document`. Unsynced documents never have an active line.
    pub fn for_document(document: &LyricsDocument) -> Self {
        Self {
            times: document.timed_lines().iter().map(|line| line.time).collect(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Recompute for `position`; returns `true` when the active index changed.
    pub fn update(&mut self, position: f64) -> bool {
        let next = if position.is_nan() {
            None
        } else {
            self.times
                .partition_point(|time| *time <= position)
                .checked_sub(1)
        };

        if next != self.current {
            self.current = next;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
