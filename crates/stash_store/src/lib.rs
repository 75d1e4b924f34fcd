//! Thread-safe resource storage for test-harness backchannels.
//!
//! `stash_store` provides [`ResourceStore`], an in-memory two-level map that
//! webhook handlers and polling test code share to hand each other messages,
//! credentials, proofs and similar payloads:
//!
//! - [`store`] - The [`ResourceStore`] handle and its atomic operations
//! - [`slot`] - Single-value and queue slots
//! - [`config`] - [`StoreConfig`] and the `pop_latest` policy
//! - [`error`] - [`StoreError`] and the crate [`Result`] alias
//!
//! Payloads are opaque to the store. The default payload type is
//! [`serde_json::Value`]; any `Clone` type works.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stash_store::{ResourceStore, StoreError};
//!
//! let store: ResourceStore = ResourceStore::new();
//! assert_eq!(store.pop_latest("events"), Err(StoreError::EmptyStore));
//!
//! store.push("conn1", "events", json!({"state": "request-received"})).unwrap();
//! assert_eq!(
//!     store.pop_latest("events").unwrap(),
//!     Some(json!({"state": "request-received"}))
//! );
//! ```

/// Store configuration.
pub mod config;

/// Error types.
pub mod error;

/// Resource slots.
pub mod slot;

/// The resource store.
pub mod store;

mod wait;

pub use config::{LatestIdPolicy, StoreConfig};
pub use error::{Result, StoreError};
pub use slot::{Slot, SlotKind};
pub use store::ResourceStore;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::StoreError;
    pub use crate::slot::*;
    pub use crate::store::*;
}
