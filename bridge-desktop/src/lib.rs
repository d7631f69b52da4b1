//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux) and for tests.
//!
//! ## Overview
//!
//! - `SqliteKeyValueStore`: `KeyValueStore` persisted with SQLite via `sqlx`
//! - `MemoryKeyValueStore`: `KeyValueStore` kept in process memory
//! - `LrcLibProvider`: `LyricsProvider` backed by lrclib.net (feature `lrclib`)
//!
//! Track transport and the native equalizer have no desktop implementation;
//! hosts inject their own.
//!
//! ## Feature Flags
//!
//! - `lrclib`: Enable the LRCLib lyrics provider (pulls in `reqwest`)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::SqliteKeyValueStore;
//! use bridge_traits::KeyValueStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqliteKeyValueStore::open_default("player").await.unwrap();
//!     store.set("favorites", "[]").await.unwrap();
//! }
//! ```

mod kv_store;
mod memory;

#[cfg(feature = "lrclib")]
mod lrclib;

pub use kv_store::SqliteKeyValueStore;
pub use memory::MemoryKeyValueStore;

#[cfg(feature = "lrclib")]
pub use lrclib::LrcLibProvider;
