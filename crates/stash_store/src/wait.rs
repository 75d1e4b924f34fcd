//! Waiting for queued resources.
//!
//! Backchannel tests usually need a webhook message that has not arrived yet.
//! [`ResourceStore::pop_wait`] replaces sleep-and-retry loops: it pops if a
//! value is queued and otherwise parks on the store's push notification until
//! a value arrives or the timeout elapses.

use crate::error::Result;
use crate::store::ResourceStore;
use core::time::Duration;
use tokio::time::Instant;

impl<V> ResourceStore<V> {
    /// Pops the oldest value under the pair, waiting up to `timeout` for one.
    ///
    /// The store lock is never held while waiting. Returns `Ok(None)` if no
    /// value was queued before the deadline.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SlotKindMismatch`](crate::StoreError::SlotKindMismatch)
    ///   if the slot holds a single value
    ///
    /// # Example
    ///
    /// ```
    /// # tokio_test_main();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test_main() {
    /// use core::time::Duration;
    /// use serde_json::json;
    /// use stash_store::ResourceStore;
    ///
    /// let store: ResourceStore = ResourceStore::new();
    /// let webhook = store.clone();
    /// tokio::spawn(async move {
    ///     webhook.push("conn1", "events", json!("connected")).unwrap();
    /// });
    ///
    /// let event = store
    ///     .pop_wait("conn1", "events", Duration::from_secs(5))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(event, Some(json!("connected")));
    /// # }
    /// ```
    pub async fn pop_wait(
        &self,
        data_id: &str,
        data_type: &str,
        timeout: Duration,
    ) -> Result<Option<V>> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register interest before checking so a push between the check
            // and the await is not missed.
            let mut notified = core::pin::pin!(self.shared.pushed.notified());
            notified.as_mut().enable();

            if let Some(value) = self.pop(data_id, data_type)? {
                return Ok(Some(value));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                tracing::debug!(data_id, data_type, ?timeout, "pop_wait timed out");
                return self.pop(data_id, data_type);
            }
        }
    }
}
