//! The shared resource store.
//!
//! [`ResourceStore`] maps a resource id to a record of typed slots:
//!
//! ```text
//! data_id ──► data_type ──► Slot::Single(value)
//!                       └─► Slot::Queue([oldest, .., newest])
//! ```
//!
//! # Thread Safety
//!
//! A single `parking_lot::Mutex` guards the whole mapping. Every operation
//! holds it from start to finish, so operations are atomic and totally ordered
//! by lock acquisition. The guard is released on every exit path, including
//! unwinding.
//!
//! Handles are cheap to clone and share the same state, so a webhook thread
//! and a polling test can each hold one.

use crate::config::{LatestIdPolicy, StoreConfig};
use crate::error::{Result, StoreError};
use crate::slot::{Slot, SlotKind};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

/// All slots recorded under one resource id.
struct Record<V> {
    slots: IndexMap<String, Slot<V>>,
    /// Clock value of the last successful `store` or `push`.
    touched: u64,
}

impl<V> Record<V> {
    fn new() -> Self {
        Self {
            slots: IndexMap::new(),
            touched: 0,
        }
    }
}

/// Lock-protected state.
struct State<V> {
    records: IndexMap<String, Record<V>>,
    clock: u64,
}

impl<V> State<V> {
    fn new() -> Self {
        Self {
            records: IndexMap::new(),
            clock: 0,
        }
    }

    /// Advances the activity clock.
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Returns the record for `data_id`, creating it if absent.
    fn record_mut(&mut self, data_id: &str) -> &mut Record<V> {
        self.records
            .entry(data_id.to_owned())
            .or_insert_with(Record::new)
    }

    fn slot(&self, data_id: &str, data_type: &str) -> Option<&Slot<V>> {
        self.records.get(data_id)?.slots.get(data_type)
    }

    fn slot_mut(&mut self, data_id: &str, data_type: &str) -> Option<&mut Slot<V>> {
        self.records.get_mut(data_id)?.slots.get_mut(data_type)
    }

    /// Index of the id `pop_latest` should use, or `None` if there are no ids.
    fn latest_index(&self, policy: LatestIdPolicy) -> Option<usize> {
        match policy {
            LatestIdPolicy::InsertionOrder => self.records.len().checked_sub(1),
            LatestIdPolicy::MostRecentActivity => self
                .records
                .values()
                .enumerate()
                .max_by_key(|(_, record)| record.touched)
                .map(|(index, _)| index),
        }
    }
}

/// State shared between all clones of a [`ResourceStore`].
pub(crate) struct Shared<V> {
    state: Mutex<State<V>>,
    /// Signalled after every successful `push`.
    pub(crate) pushed: Notify,
    config: StoreConfig,
}

/// Thread-safe two-level store of test-harness resources.
///
/// Resources are addressed by a resource id (`data_id`, e.g. a connection id)
/// and a resource type (`data_type`, e.g. `"message"`). Each pair holds either
/// a single value (`store`/`get`/`delete`) or a FIFO queue
/// (`push`/`pop`/`pop_latest`). Mixing the two on one pair fails with
/// [`StoreError::SlotKindMismatch`].
///
/// Missing keys are reported as `Ok(None)`, never as errors.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stash_store::ResourceStore;
///
/// let store: ResourceStore = ResourceStore::new();
///
/// store.store("conn1", "message", json!({"type": "ping"}));
/// assert_eq!(store.get("conn1", "message").unwrap(), Some(json!({"type": "ping"})));
/// assert_eq!(store.get("conn1", "response").unwrap(), None);
///
/// store.push("conn1", "events", json!("A")).unwrap();
/// store.push("conn1", "events", json!("B")).unwrap();
/// assert_eq!(store.pop("conn1", "events").unwrap(), Some(json!("A")));
/// assert_eq!(store.pop("conn1", "events").unwrap(), Some(json!("B")));
/// assert_eq!(store.pop("conn1", "events").unwrap(), None);
/// ```
pub struct ResourceStore<V = serde_json::Value> {
    pub(crate) shared: Arc<Shared<V>>,
}

impl<V> Clone for ResourceStore<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> Default for ResourceStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> core::fmt::Debug for ResourceStore<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("ids", &self.ids())
            .field("config", &self.shared.config)
            .finish()
    }
}

/// Logs and builds a [`StoreError::SlotKindMismatch`].
fn mismatch(data_id: &str, data_type: &str, expected: SlotKind, found: SlotKind) -> StoreError {
    tracing::warn!(data_id, data_type, %expected, %found, "slot kind mismatch");
    StoreError::slot_kind_mismatch(data_id, data_type, expected, found)
}

impl<V> ResourceStore<V> {
    /// Creates an empty store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::new()),
                pushed: Notify::new(),
                config,
            }),
        }
    }

    /// Returns the configuration this store was created with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Stores a single value, replacing whatever the slot held before.
    ///
    /// Creates the record for `data_id` if absent. A queue slot under the same
    /// key is replaced wholesale. Returns a copy of the stored value.
    pub fn store(&self, data_id: &str, data_type: &str, value: V) -> V
    where
        V: Clone,
    {
        tracing::trace!(data_id, data_type, "store resource");
        // Copy outside the lock so a panicking `Clone` cannot leave a new
        // record behind.
        let echo = value.clone();
        let mut state = self.shared.state.lock();
        let tick = state.tick();
        let record = state.record_mut(data_id);
        record
            .slots
            .insert(data_type.to_owned(), Slot::Single(value));
        record.touched = tick;
        echo
    }

    /// Returns a copy of the single value stored under the pair.
    ///
    /// Returns `Ok(None)` if the id or the type is unknown.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SlotKindMismatch`] if the slot is a queue
    pub fn get(&self, data_id: &str, data_type: &str) -> Result<Option<V>>
    where
        V: Clone,
    {
        tracing::trace!(data_id, data_type, "get resource");
        let state = self.shared.state.lock();
        let Some(slot) = state.slot(data_id, data_type) else {
            return Ok(None);
        };
        slot.as_single()
            .cloned()
            .map(Some)
            .map_err(|found| mismatch(data_id, data_type, SlotKind::Single, found))
    }

    /// Returns a snapshot of every id holding a single value for `data_type`.
    ///
    /// Ids appear in insertion order. The map holds copies; later writes to
    /// the store do not affect it.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SlotKindMismatch`] if any id holds a queue for `data_type`
    pub fn get_all(&self, data_type: &str) -> Result<IndexMap<String, V>>
    where
        V: Clone,
    {
        tracing::trace!(data_type, "get all resources");
        let state = self.shared.state.lock();
        let mut items = IndexMap::new();
        for (data_id, record) in &state.records {
            let Some(slot) = record.slots.get(data_type) else {
                continue;
            };
            let value = slot
                .as_single()
                .map_err(|found| mismatch(data_id, data_type, SlotKind::Single, found))?;
            items.insert(data_id.clone(), value.clone());
        }
        Ok(items)
    }

    /// Removes and returns the single value stored under the pair.
    ///
    /// Returns `Ok(None)` if nothing is stored, so repeated deletes are safe.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SlotKindMismatch`] if the slot is a queue (left intact)
    pub fn delete(&self, data_id: &str, data_type: &str) -> Result<Option<V>> {
        tracing::trace!(data_id, data_type, "delete resource");
        let mut state = self.shared.state.lock();
        let Some(record) = state.records.get_mut(data_id) else {
            return Ok(None);
        };
        match record.slots.get(data_type).map(Slot::kind) {
            None => Ok(None),
            Some(SlotKind::Queue) => Err(mismatch(
                data_id,
                data_type,
                SlotKind::Single,
                SlotKind::Queue,
            )),
            Some(SlotKind::Single) => Ok(record
                .slots
                .shift_remove(data_type)
                .and_then(Slot::into_single)),
        }
    }

    /// Appends a value to the back of the queue under the pair.
    ///
    /// Creates the record and an empty queue if absent, then wakes any
    /// [`pop_wait`](Self::pop_wait) callers. Returns a copy of the pushed value.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SlotKindMismatch`] if the slot holds a single value
    pub fn push(&self, data_id: &str, data_type: &str, value: V) -> Result<V>
    where
        V: Clone,
    {
        tracing::trace!(data_id, data_type, "push resource");
        let echo = value.clone();
        {
            let mut state = self.shared.state.lock();
            let tick = state.tick();
            let record = state.record_mut(data_id);
            let queue = record
                .slots
                .entry(data_type.to_owned())
                .or_insert_with(|| Slot::Queue(VecDeque::new()))
                .as_queue_mut()
                .map_err(|found| mismatch(data_id, data_type, SlotKind::Queue, found))?;
            queue.push_back(value);
            record.touched = tick;
        }
        self.shared.pushed.notify_waiters();
        Ok(echo)
    }

    /// Removes and returns the oldest value in the queue under the pair.
    ///
    /// Returns `Ok(None)` if the id, the type, or any queued value is missing.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SlotKindMismatch`] if the slot holds a single value
    pub fn pop(&self, data_id: &str, data_type: &str) -> Result<Option<V>> {
        tracing::trace!(data_id, data_type, "pop resource");
        let mut state = self.shared.state.lock();
        let Some(slot) = state.slot_mut(data_id, data_type) else {
            return Ok(None);
        };
        let queue = slot
            .as_queue_mut()
            .map_err(|found| mismatch(data_id, data_type, SlotKind::Queue, found))?;
        Ok(queue.pop_front())
    }

    /// Pops from the `data_type` queue of the "latest" resource id.
    ///
    /// For callers that do not know the resource id in advance. The id is
    /// chosen by the configured [`LatestIdPolicy`]; with the default
    /// [`InsertionOrder`](LatestIdPolicy::InsertionOrder) it is the last id in
    /// the id map's insertion order. This is a heuristic: under concurrent id
    /// creation the chosen id may not be the one the caller expects.
    ///
    /// Returns `Ok(None)` if the chosen id has no queue for `data_type` or the
    /// queue is empty.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyStore`] if no resource id has been recorded
    /// - [`StoreError::SlotKindMismatch`] if the chosen slot holds a single value
    pub fn pop_latest(&self, data_type: &str) -> Result<Option<V>> {
        let policy = self.shared.config.latest_id;
        let mut state = self.shared.state.lock();
        let (data_id, record) = state
            .latest_index(policy)
            .and_then(|index| state.records.get_index_mut(index))
            .ok_or(StoreError::EmptyStore)?;
        tracing::debug!(data_id = %data_id, data_type, ?policy, "pop latest resource");
        let Some(slot) = record.slots.get_mut(data_type) else {
            return Ok(None);
        };
        let queue = slot
            .as_queue_mut()
            .map_err(|found| mismatch(data_id, data_type, SlotKind::Queue, found))?;
        Ok(queue.pop_front())
    }

    /// Returns `true` if a slot of either kind exists under the pair.
    #[must_use]
    pub fn contains(&self, data_id: &str, data_type: &str) -> bool {
        self.shared.state.lock().slot(data_id, data_type).is_some()
    }

    /// Number of values queued under the pair.
    ///
    /// Returns 0 for a missing slot and 1 for a single-value slot.
    #[must_use]
    pub fn queue_len(&self, data_id: &str, data_type: &str) -> usize {
        self.shared
            .state
            .lock()
            .slot(data_id, data_type)
            .map_or(0, Slot::len)
    }

    /// Returns all known resource ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.shared.state.lock().records.keys().cloned().collect()
    }

    /// Returns the number of known resource ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().records.len()
    }

    /// Returns `true` if no resource id has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().records.is_empty()
    }

    /// Removes every resource id and slot.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.shared.state.lock();
            let removed = state.records.len();
            state.records.clear();
            removed
        };
        tracing::debug!(removed, "cleared resource store");
    }
}
