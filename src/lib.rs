//! A thread-safe in-memory resource store for test-harness backchannels.
//!
//! Re-exports the Stash crates for convenience:
//!
//! - [`stash_store`] - The [`ResourceStore`](stash_store::ResourceStore) and its types
//! - `stash_tracing` - Logging setup (enabled by the `tracing` feature)

pub use stash_store;

/// Logging setup.
#[cfg(feature = "tracing")]
pub use stash_tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use stash_store::prelude::*;

    #[cfg(feature = "tracing")]
    pub use stash_tracing::{TracingConfig, TracingFormat, TracingSetup};
}
