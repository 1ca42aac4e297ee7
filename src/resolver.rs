//! Read-only walks over the document tree against a [StoreSnapshot]:
//! [collect_pending] finds the in-flight uploads a save would have to wait
//! for, and [materialize] produces the save-able copy with every resolvable
//! reference inlined and every unresolvable one dropped.
//!
//! Both walks share the non-descent rule from [ReferenceNode]: a node that
//! carries a reference key is evaluated and never recursed into, even when it
//! also has children.

use std::collections::BTreeSet;

use crate::{
    document::ReferenceNode,
    key::RefKey,
    record::{Finish, UploadRecord},
    store::StoreSnapshot,
};

/// One in-flight upload still referenced by the document.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub key: RefKey,
    /// The `Uploading` record as of the snapshot.
    pub record: UploadRecord,
    pub finish: Finish,
}

/// Collect the uploads in `Uploading` state that are referenced by at least
/// one node in `nodes`, de-duplicated per key in document order. Durable keys
/// have nothing to wait for and are skipped, as are keys whose snapshot
/// record is terminal or missing.
pub fn collect_pending<N: ReferenceNode>(
    nodes: &[N],
    snapshot: &StoreSnapshot,
) -> Vec<PendingUpload> {
    let mut seen = BTreeSet::new();
    let mut pending = Vec::new();
    collect_into(nodes, snapshot, &mut seen, &mut pending);
    pending
}

fn collect_into<N: ReferenceNode>(
    nodes: &[N],
    snapshot: &StoreSnapshot,
    seen: &mut BTreeSet<RefKey>,
    pending: &mut Vec<PendingUpload>,
) {
    for node in nodes {
        if let Some(key) = node.reference() {
            // Reference-bearing nodes are leaves here, children included.
            if key.is_durable() || !seen.insert(key.clone()) {
                continue;
            }
            match (snapshot.record(key), snapshot.finish(key)) {
                (Some(record @ UploadRecord::Uploading { .. }), Some(finish)) => {
                    pending.push(PendingUpload {
                        key: key.clone(),
                        record: record.clone(),
                        finish: finish.clone(),
                    });
                }
                _ => {
                    tracing::debug!(%key, "reference not pending, nothing to wait for");
                }
            }
        } else if !node.children().is_empty() {
            collect_into(node.children(), snapshot, seen, pending);
        }
    }
}

/// Produce a new node list (the input is untouched) in which every
/// reference-bearing node is either left alone (durable key), rewritten to
/// the durable URL (`Complete` record), or dropped (missing, `Uploading` or
/// `Error` record). A missing key is a stale or cleared store, not an error.
pub fn materialize<N: ReferenceNode>(nodes: &[N], snapshot: &StoreSnapshot) -> Vec<N> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Some(key) = node.reference() {
            if key.is_durable() {
                out.push(node.clone());
                continue;
            }
            match snapshot.record(key) {
                Some(UploadRecord::Complete { url }) => {
                    // The replacement key is durable by construction; the
                    // node's own form never flips back. The transport
                    // contract guarantees the URL carries a separator, so
                    // the key keeps its form across a serde round-trip.
                    debug_assert!(url.contains('/'), "completed upload url is not durable: {url}");
                    out.push(node.with_reference(RefKey::Durable(url.clone())));
                }
                Some(UploadRecord::Uploading { .. }) => {
                    tracing::debug!(%key, "dropping node: upload still in flight");
                }
                Some(UploadRecord::Error { message, .. }) => {
                    tracing::warn!(%key, %message, "dropping node: upload failed");
                }
                None => {
                    tracing::warn!(%key, "dropping node: reference missing from store");
                }
            }
        } else if !node.children().is_empty() {
            out.push(node.with_children(materialize(node.children(), snapshot)));
        } else {
            out.push(node.clone());
        }
    }
    out
}
