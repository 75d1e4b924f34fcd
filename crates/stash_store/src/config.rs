//! Store configuration.
//!
//! [`StoreConfig`] is plain data: build it with the `with_*` methods or
//! deserialize it from a harness configuration file.
//!
//! ```
//! use stash_store::{LatestIdPolicy, ResourceStore, StoreConfig};
//!
//! let config = StoreConfig::default().with_latest_id(LatestIdPolicy::MostRecentActivity);
//! let store: ResourceStore = ResourceStore::with_config(config);
//! assert_eq!(store.config().latest_id, LatestIdPolicy::MostRecentActivity);
//! ```

use serde::{Deserialize, Serialize};

/// How `pop_latest` picks the resource id to pop from.
///
/// Neither policy is a robust definition of "most recent" under concurrent
/// id creation. Callers that know the id should use `pop` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatestIdPolicy {
    /// The last id in insertion order of the id map (default).
    #[default]
    InsertionOrder,
    /// The id most recently written by `store` or `push`.
    MostRecentActivity,
}

/// Configuration for a [`ResourceStore`](crate::ResourceStore).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Selection rule for `pop_latest`.
    pub latest_id: LatestIdPolicy,
}

impl StoreConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `pop_latest` selection rule.
    #[must_use]
    pub fn with_latest_id(mut self, policy: LatestIdPolicy) -> Self {
        self.latest_id = policy;
        self
    }
}
