//! Capability-gated adapter over the native equalizer module.
//!
//! The bridge owns no gain truth: callers pass the vector they want applied.
//! It only remembers what it last pushed so repeated identical calls are
//! no-ops, and it answers `false` for everything when the native module is
//! missing.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    BandGains, EqualizerModule,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Fallback module for platforms without a native equalizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEqualizer;

#[async_trait]
impl EqualizerModule for UnavailableEqualizer {
    async fn is_available(&self) -> bool {
        false
    }

    async fn init(&self, _session_id: i32) -> BridgeResult<()> {
        Err(unavailable())
    }

    async fn set_gains(&self, _gains: BandGains) -> BridgeResult<()> {
        Err(unavailable())
    }

    async fn set_enabled(&self, _enabled: bool) -> BridgeResult<()> {
        Err(unavailable())
    }

    async fn release(&self) -> BridgeResult<()> {
        Err(unavailable())
    }
}

fn unavailable() -> BridgeError {
    BridgeError::NotAvailable("equalizer module not present".to_string())
}

/// What the native side was last told.
#[derive(Debug, Default)]
struct NativeState {
    session_id: Option<i32>,
    enabled: Option<bool>,
    gains: Option<BandGains>,
}

pub struct EqualizerBridge {
    module: Arc<dyn EqualizerModule>,
    available: bool,
    // Held across native calls so operations reach the module in order.
    native: Mutex<NativeState>,
}

impl EqualizerBridge {
    /// Probe the module once; the answer is fixed for the bridge's lifetime.
    pub async fn detect(module: Arc<dyn EqualizerModule>) -> Self {
        let available = module.is_available().await;
        if available {
            debug!("Native equalizer detected");
        } else {
            debug!("Native equalizer unavailable, equalizer calls are no-ops");
        }

        Self {
            module,
            available,
            native: Mutex::new(NativeState::default()),
        }
    }

    /// Detect from an optional module; `None` behaves as [`UnavailableEqualizer`].
    pub async fn from_optional(module: Option<Arc<dyn EqualizerModule>>) -> Self {
        match module {
            Some(module) => Self::detect(module).await,
            None => Self::unavailable(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            module: Arc::new(UnavailableEqualizer),
            available: false,
            native: Mutex::new(NativeState::default()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Attach to an audio session. Re-initialising the same session is a no-op.
    pub async fn init(&self, session_id: i32) -> bool {
        if !self.available {
            return false;
        }

        let mut native = self.native.lock().await;
        if native.session_id == Some(session_id) {
            return true;
        }

        match self.module.init(session_id).await {
            Ok(()) => {
                // A fresh effect chain starts with default enabled/gain state
                *native = NativeState {
                    session_id: Some(session_id),
                    ..NativeState::default()
                };
                true
            }
            Err(e) => {
                warn!(session_id, error = %e, "Equalizer init failed");
                false
            }
        }
    }

    pub async fn set_gains(&self, gains: BandGains) -> bool {
        if !self.available {
            return false;
        }

        let mut native = self.native.lock().await;
        if native.gains == Some(gains) {
            return true;
        }

        match self.module.set_gains(gains).await {
            Ok(()) => {
                native.gains = Some(gains);
                true
            }
            Err(e) => {
                warn!(error = %e, "Equalizer set_gains failed");
                false
            }
        }
    }

    pub async fn set_enabled(&self, enabled: bool) -> bool {
        if !self.available {
            return false;
        }

        let mut native = self.native.lock().await;
        if native.enabled == Some(enabled) {
            return true;
        }

        match self.module.set_enabled(enabled).await {
            Ok(()) => {
                native.enabled = Some(enabled);
                true
            }
            Err(e) => {
                warn!(enabled, error = %e, "Equalizer set_enabled failed");
                false
            }
        }
    }

    /// Detach from the current session. Releasing twice is a no-op.
    pub async fn release(&self) -> bool {
        if !self.available {
            return false;
        }

        let mut native = self.native.lock().await;
        if native.session_id.is_none() {
            return true;
        }

        match self.module.release().await {
            Ok(()) => {
                *native = NativeState::default();
                true
            }
            Err(e) => {
                warn!(error = %e, "Equalizer release failed");
                false
            }
        }
    }

    /// Push `gains` again after a track load.
    ///
    /// The native effect chain is rebuilt per track, so everything cached
    /// about it is forgotten before re-initialising.
    pub async fn reapply(&self, session_id: Option<i32>, gains: BandGains) -> bool {
        if !self.available {
            return false;
        }

        *self.native.lock().await = NativeState::default();

        if let Some(session_id) = session_id {
            if !self.init(session_id).await {
                return false;
            }
        }

        let enabled = self.set_enabled(true).await;
        let applied = self.set_gains(gains).await;
        debug!(?session_id, applied, "Reapplied equalizer gains");
        enabled && applied
    }
}

impl std::fmt::Debug for EqualizerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqualizerBridge")
            .field("available", &self.available)
            .finish()
    }
}
