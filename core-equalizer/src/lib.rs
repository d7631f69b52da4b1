//! # Equalizer Module
//!
//! Translates preset selection and per-band edits into calls on the native
//! 8-band equalizer.
//!
//! ## Components
//!
//! - [`EqProfile`]: named presets and the `Custom` sentinel
//! - [`EqState`]: active profile plus the authoritative gain vector
//! - [`EqualizerBridge`]: detected-once adapter; every call returns `bool` and
//!   short-circuits to `false` when the native module is missing
//! - [`GainDrag`]: buffers slider drags so only the release reaches native code
//!
//! ## Usage
//!
//! ```ignore
//! use core_equalizer::{EqState, EqualizerBridge};
//!
//! let bridge = EqualizerBridge::from_optional(host_module).await;
//! let mut state = EqState::new();
//!
//! let gains = state.apply_profile_name("BassBoost")?;
//! bridge.set_gains(gains).await;
//!
//! // after every track load
//! bridge.reapply(session_id, state.gains()).await;
//! ```

pub mod bridge;
pub mod drag;
pub mod error;
pub mod profile;
pub mod state;

pub use bridge::{EqualizerBridge, UnavailableEqualizer};
pub use drag::GainDrag;
pub use error::{EqError, Result};
pub use profile::{
    sanitize_gain, EqProfile, BAND_FREQUENCIES_HZ, FLAT, GAIN_STEP_DB, MAX_GAIN_DB, MIN_GAIN_DB,
};
pub use state::EqState;
