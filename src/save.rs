//! The save/normalize reconciliation: race the document's in-flight uploads
//! against a timeout, then materialize a fully-resolved snapshot copy.
//!
//! `save` never mutates the live document or the store. Every call takes its
//! own snapshots, so saving concurrently with ongoing uploads (or with other
//! saves) is safe.

use std::time::Duration;

use futures::future::join_all;

use crate::{
    document::ReferenceNode,
    record::Finish,
    resolver::{collect_pending, materialize},
    store::UploadStore,
};

pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// How long to wait for in-flight uploads before giving up and returning
    /// the timeout outcome.
    pub max_timeout: Duration,
}

impl Default for SaveOptions {
    fn default() -> SaveOptions {
        SaveOptions {
            max_timeout: DEFAULT_SAVE_TIMEOUT,
        }
    }
}

impl SaveOptions {
    pub fn with_timeout(max_timeout: Duration) -> SaveOptions {
        SaveOptions { max_timeout }
    }
}

/// Result of a [save] call.
#[derive(Debug, Clone)]
pub enum SaveOutcome<N> {
    /// Every pending upload finished in time; `value` is fully materialized.
    Complete { value: Vec<N> },
    /// The timer fired first. `value` is still fully materialized as of the
    /// timeout (uploads that completed during the wait are inlined; the rest
    /// are dropped), and `finishes` holds the still-pending handles so the
    /// caller can keep waiting if desired.
    Timeout { value: Vec<N>, finishes: Vec<Finish> },
}

impl<N> SaveOutcome<N> {
    pub fn is_complete(&self) -> bool {
        matches!(self, SaveOutcome::Complete { .. })
    }

    /// The materialized document, whichever way the race went.
    pub fn value(&self) -> &[N] {
        match self {
            SaveOutcome::Complete { value } => value,
            SaveOutcome::Timeout { value, .. } => value,
        }
    }

    pub fn into_value(self) -> Vec<N> {
        match self {
            SaveOutcome::Complete { value } => value,
            SaveOutcome::Timeout { value, .. } => value,
        }
    }
}

/// Wait (bounded by `options.max_timeout`) for the uploads referenced by
/// `nodes`, then return a materialized copy.
///
/// 1. Snapshot the store and collect the in-flight records reachable from
///    the document. An empty set completes immediately, whatever the timeout.
/// 2. Race the joined finish handles against the timer. Finish handles never
///    reject, so a failed upload cannot abort the join.
/// 3. Re-snapshot (records changed during the wait) and materialize.
///
/// The timer is owned by the `timeout` future and is dropped, i.e. cancelled,
/// as soon as the race resolves; a lost timer cannot fire later.
pub async fn save<N: ReferenceNode>(
    nodes: &[N],
    store: &UploadStore,
    options: SaveOptions,
) -> SaveOutcome<N> {
    let snapshot = store.snapshot();
    let pending = collect_pending(nodes, &snapshot);
    if pending.is_empty() {
        tracing::debug!("save: no pending uploads");
        return SaveOutcome::Complete {
            value: materialize(nodes, &snapshot),
        };
    }

    tracing::info!(
        pending = pending.len(),
        timeout_ms = options.max_timeout.as_millis() as u64,
        "save: waiting for in-flight uploads"
    );
    let finishes = join_all(pending.iter().map(|upload| upload.finish.settled()));
    match tokio::time::timeout(options.max_timeout, finishes).await {
        Ok(_settled) => {
            let fresh = store.snapshot();
            SaveOutcome::Complete {
                value: materialize(nodes, &fresh),
            }
        }
        Err(_elapsed) => {
            // The pending set may have shrunk while we waited; report only
            // what is still in flight. The uploads themselves keep running
            // and will settle into the store later.
            let at_timeout = store.snapshot();
            let still_pending = collect_pending(nodes, &at_timeout);
            tracing::warn!(
                still_pending = still_pending.len(),
                "save: timed out waiting for uploads"
            );
            SaveOutcome::Timeout {
                value: materialize(nodes, &at_timeout),
                finishes: still_pending
                    .into_iter()
                    .map(|upload| upload.finish)
                    .collect(),
            }
        }
    }
}

/// Synchronous materialize against the current store snapshot, no waiting.
pub fn normalize<N: ReferenceNode>(nodes: &[N], store: &UploadStore) -> Vec<N> {
    materialize(nodes, &store.snapshot())
}
