//! Equalizer presets.

use bridge_traits::{BandGains, EQ_BAND_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EqError;

/// Centre frequency of each band, in Hz.
pub const BAND_FREQUENCIES_HZ: [u32; EQ_BAND_COUNT] = [60, 170, 310, 600, 1_000, 3_000, 6_000, 12_000];

pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;
/// Gains are stored with this resolution.
pub const GAIN_STEP_DB: f32 = 0.1;

pub const FLAT: BandGains = [0.0; EQ_BAND_COUNT];

/// Named equalizer profile.
///
/// `Custom` is the sentinel for a user-edited vector and has no preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EqProfile {
    #[default]
    Normal,
    BassBoost,
    TrebleBoost,
    Vocal,
    Rock,
    Pop,
    Jazz,
    Classical,
    Electronic,
    HipHop,
    Custom,
}

impl EqProfile {
    /// Every profile, presets first, `Custom` last.
    pub const ALL: [EqProfile; 11] = [
        EqProfile::Normal,
        EqProfile::BassBoost,
        EqProfile::TrebleBoost,
        EqProfile::Vocal,
        EqProfile::Rock,
        EqProfile::Pop,
        EqProfile::Jazz,
        EqProfile::Classical,
        EqProfile::Electronic,
        EqProfile::HipHop,
        EqProfile::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EqProfile::Normal => "Normal",
            EqProfile::BassBoost => "BassBoost",
            EqProfile::TrebleBoost => "TrebleBoost",
            EqProfile::Vocal => "Vocal",
            EqProfile::Rock => "Rock",
            EqProfile::Pop => "Pop",
            EqProfile::Jazz => "Jazz",
            EqProfile::Classical => "Classical",
            EqProfile::Electronic => "Electronic",
            EqProfile::HipHop => "HipHop",
            EqProfile::Custom => "Custom",
        }
    }

    /// Fixed gain vector of a preset. `None` for `Custom`.
    pub fn preset_gains(&self) -> Option<BandGains> {
        let gains = match self {
            EqProfile::Normal => FLAT,
            EqProfile::BassBoost => [6.0, 5.0, 3.5, 1.5, 0.0, 0.0, 0.0, 0.0],
            EqProfile::TrebleBoost => [0.0, 0.0, 0.0, 0.0, 1.5, 3.5, 5.0, 6.0],
            EqProfile::Vocal => [-2.0, -1.0, 0.0, 2.0, 4.0, 4.0, 2.0, 0.0],
            EqProfile::Rock => [5.0, 3.0, -1.0, -2.0, -1.0, 2.0, 4.0, 5.0],
            EqProfile::Pop => [-1.0, 1.0, 3.0, 4.0, 3.0, 1.0, -1.0, -1.0],
            EqProfile::Jazz => [3.0, 2.0, 0.0, 1.5, -1.0, -1.0, 0.0, 2.5],
            EqProfile::Classical => [4.0, 3.0, 2.0, 0.0, 0.0, 0.0, 2.0, 3.0],
            EqProfile::Electronic => [5.0, 4.0, 1.0, 0.0, -2.0, 2.0, 3.0, 5.0],
            EqProfile::HipHop => [5.0, 4.0, 2.0, 0.0, -1.0, 1.0, 0.0, 2.0],
            EqProfile::Custom => return None,
        };
        Some(gains)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, EqProfile::Custom)
    }
}

impl fmt::Display for EqProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EqProfile {
    type Err = EqError;

    /// Case-insensitive; spaces, `-` and `_` are ignored ("Bass Boost", "bass_boost").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        EqProfile::ALL
            .iter()
            .copied()
            .find(|profile| profile.name().to_lowercase() == wanted)
            .ok_or_else(|| EqError::UnknownProfile(s.to_string()))
    }
}

/// Clamp to [`MIN_GAIN_DB`, `MAX_GAIN_DB`] and snap to [`GAIN_STEP_DB`].
pub fn sanitize_gain(value: f32) -> f32 {
    let steps_per_db = (1.0 / GAIN_STEP_DB).round();
    let snapped = ((value * steps_per_db).round() / steps_per_db).clamp(MIN_GAIN_DB, MAX_GAIN_DB);
    // avoid -0.0 leaking into persisted JSON
    if snapped == 0.0 {
        0.0
    } else {
        snapped
    }
}
