//! Playback modes and queue navigation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy for resolving next/previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Normal,
    Repeat,
    RepeatOne,
    Shuffle,
}

impl PlaybackMode {
    pub const CYCLE: [PlaybackMode; 4] = [
        PlaybackMode::Normal,
        PlaybackMode::Repeat,
        PlaybackMode::RepeatOne,
        PlaybackMode::Shuffle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Normal => "normal",
            PlaybackMode::Repeat => "repeat",
            PlaybackMode::RepeatOne => "repeat_one",
            PlaybackMode::Shuffle => "shuffle",
        }
    }

    /// Next mode in `normal -> repeat -> repeat_one -> shuffle -> normal`.
    pub fn cycled(&self) -> PlaybackMode {
        match self {
            PlaybackMode::Normal => PlaybackMode::Repeat,
            PlaybackMode::Repeat => PlaybackMode::RepeatOne,
            PlaybackMode::RepeatOne => PlaybackMode::Shuffle,
            PlaybackMode::Shuffle => PlaybackMode::Normal,
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlaybackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlaybackMode::CYCLE
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown playback mode: {s}"))
    }
}

/// Index to load for "next". `None` means stay put.
///
/// With nothing selected, navigation starts at the first song.
pub fn next_index<R: Rng + ?Sized>(
    mode: PlaybackMode,
    current: Option<usize>,
    len: usize,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let Some(current) = current.filter(|&c| c < len) else {
        return Some(0);
    };

    match mode {
        PlaybackMode::RepeatOne => Some(current),
        PlaybackMode::Normal => (current + 1 < len).then_some(current + 1),
        PlaybackMode::Repeat => Some((current + 1) % len),
        PlaybackMode::Shuffle => Some(random_other(current, len, rng)),
    }
}

/// Index to load for "previous". `None` means stay put.
pub fn previous_index<R: Rng + ?Sized>(
    mode: PlaybackMode,
    current: Option<usize>,
    len: usize,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let Some(current) = current.filter(|&c| c < len) else {
        return Some(0);
    };

    match mode {
        PlaybackMode::RepeatOne => Some(current),
        PlaybackMode::Normal => current.checked_sub(1),
        PlaybackMode::Repeat => Some(current.checked_sub(1).unwrap_or(len - 1)),
        PlaybackMode::Shuffle => Some(random_other(current, len, rng)),
    }
}

/// Uniform pick among indices other than `current`; a single song replays.
fn random_other<R: Rng + ?Sized>(current: usize, len: usize, rng: &mut R) -> usize {
    if len <= 1 {
        return current;
    }
    let pick = rng.gen_range(0..len - 1);
    if pick >= current {
        pick + 1
    } else {
        pick
    }
}
