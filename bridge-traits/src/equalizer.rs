//! Native equalizer capability.
//!
//! Only some platforms expose an 8-band equalizer (Android's `AudioEffect`
//! chain). Hosts without one either pass no module at all or an
//! implementation whose [`EqualizerModule::is_available`] returns `false`.

use async_trait::async_trait;

use crate::error::Result;

/// Number of bands the native equalizer exposes.
pub const EQ_BAND_COUNT: usize = 8;

/// Gain per band, in decibels.
pub type BandGains = [f32; EQ_BAND_COUNT];

#[async_trait]
pub trait EqualizerModule: Send + Sync {
    /// Whether the native module is present on this device.
    ///
    /// Called once at startup; the answer is cached by the caller.
    async fn is_available(&self) -> bool;

    /// Attach the effect chain to an audio session.
    async fn init(&self, session_id: i32) -> Result<()>;

    /// Push all band gains at once.
    async fn set_gains(&self, gains: BandGains) -> Result<()>;

    /// Enable or bypass the effect.
    async fn set_enabled(&self, enabled: bool) -> Result<()>;

    /// Detach and free native resources.
    async fn release(&self) -> Result<()>;
}
