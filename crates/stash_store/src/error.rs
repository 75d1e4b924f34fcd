//! Error types for store operations.
//!
//! Missing keys are not errors: lookups report absence as `Ok(None)`. The
//! variants here cover the two cases a caller has to handle explicitly.

use crate::slot::SlotKind;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// `pop_latest` was called before any resource id was recorded.
    #[error("store is empty: no resource ids have been recorded")]
    EmptyStore,

    /// The slot exists but holds the other kind of value.
    ///
    /// Returned when single-value operations (`get`, `get_all`, `delete`) hit
    /// a queue slot, or queue operations (`push`, `pop`) hit a single-value
    /// slot. The slot is left untouched.
    #[error("slot {data_id}/{data_type} holds a {found} value, expected {expected}")]
    SlotKindMismatch {
        /// Resource id of the offending slot.
        data_id: String,
        /// Resource type of the offending slot.
        data_type: String,
        /// Kind the operation works on.
        expected: SlotKind,
        /// Kind currently stored.
        found: SlotKind,
    },
}

impl StoreError {
    /// Creates a [`SlotKindMismatch`](Self::SlotKindMismatch).
    pub fn slot_kind_mismatch(
        data_id: impl Into<String>,
        data_type: impl Into<String>,
        expected: SlotKind,
        found: SlotKind,
    ) -> Self {
        Self::SlotKindMismatch {
            data_id: data_id.into(),
            data_type: data_type.into(),
            expected,
            found,
        }
    }
}

/// Result alias for store operations.
pub type Result<T, E = StoreError> = core::result::Result<T, E>;
