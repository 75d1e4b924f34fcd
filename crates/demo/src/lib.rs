//! Webhook relay demo.
//!
//! Mirrors how a backchannel uses the store: an agent delivers webhook
//! events for several connections on its own task, while test code waits for
//! specific events and reads the latest connection state.
//!
//! ```text
//! webhook task ──push("conn-N", "events")──► ResourceStore ◄──pop_wait── test code
//!              ──store("conn-N", "state")──►               ◄──get_all──
//! ```

use core::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stash_store::{ResourceStore, StoreError};

/// A webhook event as delivered by the agent under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Connection the event belongs to.
    pub connection_id: String,
    /// Protocol state reported by the agent.
    pub state: String,
}

/// Protocol states a connection walks through.
pub const STATES: [&str; 3] = ["invitation", "request", "active"];

/// Resource type for queued webhook events.
pub const EVENTS: &str = "events";

/// Resource type for the current connection state.
pub const STATE: &str = "state";

/// Connection id used for the `index`th simulated connection.
#[must_use]
pub fn connection_id(index: usize) -> String {
    format!("conn-{index}")
}

/// Delivers every state of every connection, as the webhook handler would.
///
/// Each event is queued under [`EVENTS`] and also recorded as the
/// connection's current [`STATE`].
///
/// # Errors
///
/// Returns [`StoreError::SlotKindMismatch`] if a slot was already used the
/// other way.
pub async fn deliver_webhooks(
    store: ResourceStore,
    connections: usize,
    delay: Duration,
) -> Result<(), StoreError> {
    for state in STATES {
        for index in 0..connections {
            let id = connection_id(index);
            let payload = json!({ "connection_id": id, "state": state });
            store.push(&id, EVENTS, payload)?;
            store.store(&id, STATE, json!(state));
            tracing::info!(connection_id = %id, state, "webhook delivered");
        }
        tokio::time::sleep(delay).await;
    }
    Ok(())
}

/// Waits for the full state sequence of one connection.
///
/// Returns the states in arrival order. Stops early if an event does not
/// arrive within `timeout`.
///
/// # Errors
///
/// Returns [`StoreError::SlotKindMismatch`] if the events slot holds a single
/// value.
pub async fn await_handshake(
    store: &ResourceStore,
    connection: &str,
    timeout: Duration,
) -> Result<Vec<String>, StoreError> {
    let mut states = Vec::with_capacity(STATES.len());
    while states.len() < STATES.len() {
        let Some(payload) = store.pop_wait(connection, EVENTS, timeout).await? else {
            tracing::warn!(connection, received = states.len(), "handshake timed out");
            break;
        };
        match serde_json::from_value::<WebhookEvent>(payload) {
            Ok(event) => states.push(event.state),
            Err(err) => tracing::warn!(connection, %err, "ignoring malformed webhook event"),
        }
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handshake_sees_every_state_in_order() {
        let store: ResourceStore = ResourceStore::new();
        let webhook = tokio::spawn(deliver_webhooks(store.clone(), 3, Duration::from_millis(5)));

        for index in 0..3 {
            let states = await_handshake(&store, &connection_id(index), Duration::from_secs(5))
                .await
                .unwrap();
            assert_eq!(states, STATES);
        }
        webhook.await.unwrap().unwrap();

        let current = store.get_all(STATE).unwrap();
        assert_eq!(current.len(), 3);
        assert!(current.values().all(|state| state == "active"));
    }

    #[tokio::test]
    async fn delivered_payloads_decode_as_events() {
        let store: ResourceStore = ResourceStore::new();
        deliver_webhooks(store.clone(), 1, Duration::ZERO).await.unwrap();

        let payload = store.pop("conn-0", EVENTS).unwrap().unwrap();
        let event: WebhookEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(
            event,
            WebhookEvent {
                connection_id: "conn-0".to_string(),
                state: "invitation".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn handshake_stops_on_timeout() {
        let store: ResourceStore = ResourceStore::new();
        let states = await_handshake(&store, "conn-0", Duration::from_millis(10))
            .await
            .unwrap();
        assert!(states.is_empty());
    }
}
