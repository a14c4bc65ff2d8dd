//! Periodic synchronization of the remote inventory into the store.

use crate::error::ServiceResult;
use chrono::DateTime;
use fleetwatch_remote::{RemoteAgent, SessionClient};
use fleetwatch_store::{AgentObservation, AgentStore};
use std::time::Duration;
use tracing::{error, info, warn};

/// Drives sync passes: fetch the remote inventory, map each record, and
/// upsert it with change tracking.
///
/// The engine owns the session client — it is the sole writer of token
/// state — and passes run strictly one at a time: `run` awaits each
/// pass to completion inside a single task, so two passes can never
/// compute deltas against the same row concurrently.
pub struct SyncEngine {
    client: SessionClient,
    store: AgentStore,
}

impl SyncEngine {
    pub fn new(client: SessionClient, store: AgentStore) -> Self {
        Self { client, store }
    }

    /// Runs one sync pass and returns the number of records upserted.
    ///
    /// A fetch failure fails the whole pass — there is nothing to diff
    /// without a source list. A per-record store failure is logged and
    /// skipped; the pass continues with the remaining records.
    pub async fn sync_once(&mut self) -> ServiceResult<usize> {
        let agents = self.client.fetch_all().await?;
        let fetched = agents.len();

        let mut processed = 0usize;
        for remote in agents {
            let obs = observation_from(remote);
            match self.store.upsert(&obs) {
                Ok(()) => processed += 1,
                Err(e) => {
                    warn!(external_id = %obs.external_id, "failed to upsert agent: {e}");
                }
            }
        }

        info!("synced {processed} of {fetched} agents");
        Ok(processed)
    }

    /// Runs one immediate pass, then one pass per interval tick, forever.
    /// Failed passes are logged and retried on the next tick — no
    /// backoff, never fatal.
    pub async fn run(mut self, interval: Duration) {
        info!("sync engine started, interval {}s", interval.as_secs());

        if let Err(e) = self.sync_once().await {
            error!("initial sync failed: {e}");
        }

        let mut ticker = tokio::time::interval(interval);
        // Skip first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.sync_once().await {
                error!("sync pass failed: {e}");
            }
        }
    }
}

/// Maps a remote record to a store observation. The epoch-millisecond
/// heartbeat becomes a second-precision timestamp; zero or negative
/// means never connected.
fn observation_from(remote: RemoteAgent) -> AgentObservation {
    let last_connect = if remote.last_keep_alive > 0 {
        DateTime::from_timestamp(remote.last_keep_alive / 1000, 0)
    } else {
        None
    };

    AgentObservation {
        external_id: remote.id,
        name: remote.name,
        address: remote.address,
        status: remote.status,
        group_name: remote.group,
        version: remote.version,
        last_connect,
    }
}
