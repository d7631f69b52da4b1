//! Equalizer bridge behaviour against a mocked native module

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{BandGains, EqualizerModule};
use core_equalizer::{EqProfile, EqState, EqualizerBridge, UnavailableEqualizer, FLAT};
use mockall::predicate::eq;
use mockall::{mock, Sequence};
use std::sync::Arc;

mock! {
    pub Module {}

    #[async_trait]
    impl EqualizerModule for Module {
        async fn is_available(&self) -> bool;
        async fn init(&self, session_id: i32) -> BridgeResult<()>;
        async fn set_gains(&self, gains: BandGains) -> BridgeResult<()>;
        async fn set_enabled(&self, enabled: bool) -> BridgeResult<()>;
        async fn release(&self) -> BridgeResult<()>;
    }
}

fn available_module() -> MockModule {
    let mut module = MockModule::new();
    module.expect_is_available().times(1).return_const(true);
    module
}

#[tokio::test]
async fn test_missing_module_short_circuits() {
    let bridge = EqualizerBridge::from_optional(None).await;

    assert!(!bridge.is_available());
    assert!(!bridge.init(7).await);
    assert!(!bridge.set_gains(FLAT).await);
    assert!(!bridge.set_enabled(true).await);
    assert!(!bridge.release().await);
    assert!(!bridge.reapply(Some(7), FLAT).await);
}

#[tokio::test]
async fn test_unavailable_module_never_called_after_detection() {
    let mut module = MockModule::new();
    module.expect_is_available().times(1).return_const(false);
    module.expect_init().never();
    module.expect_set_gains().never();

    let bridge = EqualizerBridge::detect(Arc::new(module)).await;
    assert!(!bridge.init(1).await);
    assert!(!bridge.set_gains(FLAT).await);
}

#[tokio::test]
async fn test_fallback_module_reports_unavailable() {
    let fallback = UnavailableEqualizer;
    assert!(!fallback.is_available().await);
    assert!(fallback.init(1).await.unwrap_err().is_not_available());
}

#[tokio::test]
async fn test_repeated_calls_are_idempotent() {
    let mut module = available_module();
    module.expect_init().with(eq(3)).times(1).returning(|_| Ok(()));
    module.expect_set_enabled().with(eq(true)).times(1).returning(|_| Ok(()));
    module.expect_set_gains().times(1).returning(|_| Ok(()));
    module.expect_release().times(1).returning(|| Ok(()));

    let bridge = EqualizerBridge::detect(Arc::new(module)).await;
    let gains = EqProfile::Rock.preset_gains().unwrap();

    assert!(bridge.init(3).await);
    assert!(bridge.init(3).await);
    assert!(bridge.set_enabled(true).await);
    assert!(bridge.set_enabled(true).await);
    assert!(bridge.set_gains(gains).await);
    assert!(bridge.set_gains(gains).await);
    assert!(bridge.release().await);
    assert!(bridge.release().await);
}

#[tokio::test]
async fn test_native_failure_returns_false() {
    let mut module = available_module();
    module
        .expect_set_gains()
        .times(2)
        .returning(|_| Err(BridgeError::OperationFailed("effect busy".to_string())));

    let bridge = EqualizerBridge::detect(Arc::new(module)).await;
    assert!(!bridge.set_gains(FLAT).await);
    // Failure is not cached, the next call retries
    assert!(!bridge.set_gains(FLAT).await);
}

#[tokio::test]
async fn test_reapply_pushes_again_after_track_load() {
    let mut state = EqState::new();
    let gains = state.apply_profile(EqProfile::BassBoost);

    let mut module = available_module();
    let mut seq = Sequence::new();
    module
        .expect_init()
        .with(eq(10))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    module
        .expect_set_enabled()
        .with(eq(true))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    module
        .expect_set_gains()
        .with(eq(gains))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    // Second track reuses the same session id; native state was reset anyway
    module
        .expect_init()
        .with(eq(10))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    module
        .expect_set_enabled()
        .with(eq(true))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    module
        .expect_set_gains()
        .with(eq(gains))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let bridge = EqualizerBridge::detect(Arc::new(module)).await;
    assert!(bridge.reapply(Some(10), state.gains()).await);
    assert!(bridge.reapply(Some(10), state.gains()).await);
}

#[tokio::test]
async fn test_reapply_without_session_skips_init() {
    let mut module = available_module();
    module.expect_init().never();
    module.expect_set_enabled().times(1).returning(|_| Ok(()));
    module.expect_set_gains().times(1).returning(|_| Ok(()));

    let bridge = EqualizerBridge::detect(Arc::new(module)).await;
    assert!(bridge.reapply(None, FLAT).await);
}
