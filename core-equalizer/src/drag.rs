//! Gain slider gesture buffer.
//!
//! While a band slider is being dragged, the displayed gain follows the
//! finger but nothing reaches the native module. The final value is handed
//! back once on release.

use bridge_traits::{BandGains, EQ_BAND_COUNT};

use crate::error::{EqError, Result};
use crate::profile::sanitize_gain;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveDrag {
    band: usize,
    value: f32,
}

#[derive(Debug, Default, Clone)]
pub struct GainDrag {
    active: Option<ActiveDrag>,
}

impl GainDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Band currently being dragged.
    pub fn band(&self) -> Option<usize> {
        self.active.map(|drag| drag.band)
    }

    /// Record a preview value. Switching band restarts the gesture.
    pub fn update(&mut self, band: usize, value: f32) -> Result<f32> {
        if band >= EQ_BAND_COUNT {
            return Err(EqError::BandOutOfRange {
                index: band,
                count: EQ_BAND_COUNT,
            });
        }
        if !value.is_finite() {
            return Err(EqError::InvalidGain(value));
        }

        let value = sanitize_gain(value);
        self.active = Some(ActiveDrag { band, value });
        Ok(value)
    }

    /// `committed` with the in-flight preview overlaid.
    pub fn display_gains(&self, committed: BandGains) -> BandGains {
        let mut gains = committed;
        if let Some(drag) = self.active {
            gains[drag.band] = drag.value;
        }
        gains
    }

    /// End the gesture, yielding `(band, value)` to commit.
    pub fn finish(&mut self) -> Option<(usize, f32)> {
        self.active.take().map(|drag| (drag.band, drag.value))
    }

    /// Abandon the gesture without committing.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}
