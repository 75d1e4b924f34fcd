//! Webhook relay demo CLI.
//!
//! Simulates an agent delivering connection webhooks while test code waits
//! for them through a shared [`ResourceStore`].
//!
//! # Usage
//!
//! ```bash
//! webhook_relay [connections]
//! ```
//!
//! Honors `RUST_LOG` (e.g. `RUST_LOG=stash_store=trace`).

use core::time::Duration;
use demo::{EVENTS, STATE, await_handshake, connection_id, deliver_webhooks};
use stash_store::{LatestIdPolicy, ResourceStore, StoreConfig};
use stash_tracing::{TracingFormat, TracingSetup};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    TracingSetup::new()
        .with_format(TracingFormat::Compact)
        .init();

    let connections = match std::env::args().nth(1).map(|arg| arg.parse::<usize>()) {
        None => 3,
        Some(Ok(n)) if n > 0 => n,
        Some(_) => {
            tracing::error!("connections must be a positive integer");
            std::process::exit(1);
        }
    };

    let store: ResourceStore = ResourceStore::with_config(
        StoreConfig::new().with_latest_id(LatestIdPolicy::MostRecentActivity),
    );

    let webhook = tokio::spawn(deliver_webhooks(
        store.clone(),
        connections,
        Duration::from_millis(50),
    ));

    // The last connection is consumed without knowing its id.
    for index in 0..connections - 1 {
        let id = connection_id(index);
        match await_handshake(&store, &id, Duration::from_secs(2)).await {
            Ok(states) => tracing::info!(connection = %id, ?states, "handshake complete"),
            Err(err) => tracing::error!(connection = %id, %err, "handshake failed"),
        }
    }

    match webhook.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(%err, "webhook delivery failed"),
        Err(err) => tracing::error!(%err, "webhook task panicked"),
    }

    loop {
        match store.pop_latest(EVENTS) {
            Ok(Some(event)) => tracing::info!(%event, "popped latest event"),
            Ok(None) => break,
            Err(err) => {
                tracing::error!(%err, "pop_latest failed");
                break;
            }
        }
    }

    match store.get_all(STATE) {
        Ok(states) => {
            for (id, state) in states {
                tracing::info!(connection = %id, %state, "final state");
            }
        }
        Err(err) => tracing::error!(%err, "could not read connection states"),
    }
}
