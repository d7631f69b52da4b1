//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service` and, through it, `bridge-desktop`). Host applications can
//! depend on `player-workspace` and enable `desktop-shims` or `lrclib`
//! without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, PlayerCore};
