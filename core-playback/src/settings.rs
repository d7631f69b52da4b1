//! Persisted player preferences under `player_settings`.

use bridge_traits::{BandGains, KeyValueStore};
use core_equalizer::{EqProfile, EqState, FLAT};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::song::StreamQuality;

pub const SETTINGS_KEY: &str = "player_settings";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSettings {
    pub stream_quality: StreamQuality,
    pub eq_profile: EqProfile,
    pub eq_gains: BandGainsField,
}

/// Gain vector wrapper so a missing field defaults to flat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandGainsField(pub BandGains);

impl Default for BandGainsField {
    fn default() -> Self {
        Self(FLAT)
    }
}

impl PlayerSettings {
    pub fn eq_state(&self) -> EqState {
        EqState::from_parts(self.eq_profile, self.eq_gains.0)
    }

    pub fn with_eq_state(mut self, eq: &EqState) -> Self {
        self.eq_profile = eq.profile();
        self.eq_gains = BandGainsField(eq.gains());
        self
    }

    /// Missing or corrupt settings fall back to defaults.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(SETTINGS_KEY).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Stored player settings are invalid, using defaults");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read player settings");
                Self::default()
            }
        }
    }

    /// Best-effort write. Returns whether it succeeded.
    pub async fn save(&self, store: &dyn KeyValueStore) -> bool {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode player settings");
                return false;
            }
        };
        match store.set(SETTINGS_KEY, &json).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist player settings");
                false
            }
        }
    }
}
