//! Storage cells for a single `(data_id, data_type)` pair.

use std::collections::VecDeque;

/// The kind of value a [`Slot`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// One value, overwritten on each store.
    Single,
    /// FIFO queue of values.
    Queue,
}

impl core::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Queue => f.write_str("queue"),
        }
    }
}

/// Storage cell for one `(data_id, data_type)` pair.
///
/// A slot is created by the first `store` (single) or `push` (queue) on its
/// key. `store` always replaces the slot wholesale; queue operations only
/// ever touch queue slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<V> {
    /// Last write wins.
    Single(V),
    /// Oldest item at the front.
    Queue(VecDeque<V>),
}

impl<V> Slot<V> {
    /// Returns the kind of this slot.
    #[must_use]
    pub fn kind(&self) -> SlotKind {
        match self {
            Self::Single(_) => SlotKind::Single,
            Self::Queue(_) => SlotKind::Queue,
        }
    }

    /// Returns the single value, or the kind found instead.
    pub(crate) fn as_single(&self) -> Result<&V, SlotKind> {
        match self {
            Self::Single(value) => Ok(value),
            Self::Queue(_) => Err(SlotKind::Queue),
        }
    }

    /// Consumes the slot, returning the value if it is a single slot.
    pub(crate) fn into_single(self) -> Option<V> {
        match self {
            Self::Single(value) => Some(value),
            Self::Queue(_) => None,
        }
    }

    /// Returns the queue for mutation, or the kind found instead.
    pub(crate) fn as_queue_mut(&mut self) -> Result<&mut VecDeque<V>, SlotKind> {
        match self {
            Self::Queue(queue) => Ok(queue),
            Self::Single(_) => Err(SlotKind::Single),
        }
    }

    /// Number of values held: 1 for a single slot, queue length otherwise.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Queue(queue) => queue.len(),
        }
    }

    /// Returns `true` for an empty queue slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
