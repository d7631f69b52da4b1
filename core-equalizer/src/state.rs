//! Profile-vs-custom gain state machine.

use bridge_traits::{BandGains, EQ_BAND_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::{EqError, Result};
use crate::profile::{sanitize_gain, EqProfile, FLAT};

/// Active profile plus the authoritative gain vector.
///
/// Invariants:
/// - selecting a preset overwrites every gain with the preset's values
/// - editing a band switches the profile to `Custom` and changes only that band
/// - every stored gain is within [-12, 12] dB on a 0.1 dB grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqState {
    profile: EqProfile,
    gains: BandGains,
}

impl Default for EqState {
    fn default() -> Self {
        Self {
            profile: EqProfile::Normal,
            gains: FLAT,
        }
    }
}

impl EqState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted values, sanitising every gain.
    pub fn from_parts(profile: EqProfile, gains: BandGains) -> Self {
        Self {
            profile,
            gains: gains.map(sanitize_gain),
        }
    }

    pub fn profile(&self) -> EqProfile {
        self.profile
    }

    pub fn gains(&self) -> BandGains {
        self.gains
    }

    /// Select a profile.
    ///
    /// Presets overwrite the whole vector. Selecting `Custom` only flips the
    /// label and keeps the current gains.
    pub fn apply_profile(&mut self, profile: EqProfile) -> BandGains {
        if let Some(preset) = profile.preset_gains() {
            self.gains = preset;
        }
        self.profile = profile;
        self.gains
    }

    pub fn apply_profile_name(&mut self, name: &str) -> Result<BandGains> {
        let profile = name.parse::<EqProfile>()?;
        Ok(self.apply_profile(profile))
    }

    /// Edit one band. Returns the stored (clamped, snapped) value.
    pub fn update_custom_gain(&mut self, index: usize, value: f32) -> Result<f32> {
        if index >= EQ_BAND_COUNT {
            return Err(EqError::BandOutOfRange {
                index,
                count: EQ_BAND_COUNT,
            });
        }
        if !value.is_finite() {
            return Err(EqError::InvalidGain(value));
        }

        let gain = sanitize_gain(value);
        self.gains[index] = gain;
        self.profile = EqProfile::Custom;
        Ok(gain)
    }
}
