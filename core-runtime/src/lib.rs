//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the player core:
//! - Logging and tracing bootstrap
//! - Configuration (`CoreConfig` builder)
//! - Typed event bus
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its event types and
//! configuration. It holds no player state of its own.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FeatureFlags, PlaybackTuning, RetryPolicy};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
