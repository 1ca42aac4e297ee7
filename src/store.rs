//! # Upload Store - Session-Scoped Upload Registry
//!
//! [UploadStore] maps ephemeral [RefKey]s to [UploadRecord]s and notifies
//! subscribers when any key's record changes. It is derived, transient state:
//! instantiated once per editor session, never persisted, and deliberately
//! kept outside the document's undo/redo history so upload progress never
//! becomes an undoable edit.
//!
//! The store is never a process-wide global. Construct one per editor
//! instance and pass it down; `Clone` shares the same underlying registry.
//!
//! There is exactly one writer per key (that key's upload task), so `set` is
//! a plain wholesale replace with last-write-wins semantics. There is no
//! deletion: completed and errored records remain until the store is dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::{
    error::AttacheError,
    event::UploadEvent,
    key::RefKey,
    record::{finish_channel, Finish, FinishSignal, UploadRecord},
};

/// Buffered change events per subscriber. Progress UIs that lag simply miss
/// ticks and re-read the snapshot on the next event they do see.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Registry {
    records: BTreeMap<RefKey, UploadRecord>,
    finishes: BTreeMap<RefKey, Finish>,
    /// Present until the key settles; consumed on the terminal transition.
    signals: BTreeMap<RefKey, FinishSignal>,
}

/// Keyed registry of [UploadRecord]s with change notification.
#[derive(Debug, Clone)]
pub struct UploadStore {
    registry: Arc<RwLock<Registry>>,
    events: broadcast::Sender<UploadEvent>,
}

impl Default for UploadStore {
    fn default() -> Self {
        UploadStore::new()
    }
}

impl UploadStore {
    pub fn new() -> UploadStore {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        UploadStore {
            registry: Arc::new(RwLock::new(Registry::default())),
            events,
        }
    }

    /// Store pre-seeded with known records, e.g. when reopening a document
    /// whose pending references were tracked in a previous session. Seeded
    /// terminal records arrive already settled; seeded uploading records
    /// stay pending until something `set`s them to a terminal state.
    pub fn with_records<I>(records: I) -> UploadStore
    where
        I: IntoIterator<Item = (RefKey, UploadRecord)>,
    {
        let store = UploadStore::new();
        for (key, record) in records {
            store.set(key, record);
        }
        store
    }

    /// Replace the record for `key` wholesale. An unknown key is created.
    ///
    /// Setting a terminal record settles the key's [Finish] handle exactly
    /// once; the order is store update, then change event, then settle, so
    /// a waiter woken by the finish always observes the terminal record in
    /// the store.
    pub fn set(&self, key: RefKey, record: UploadRecord) {
        let (event, settle) = {
            let mut registry = self.registry.write();
            let known = registry.records.contains_key(&key);
            if !known {
                let (signal, finish) = finish_channel();
                registry.signals.insert(key.clone(), signal);
                registry.finishes.insert(key.clone(), finish);
            }
            let previous = registry.records.insert(key.clone(), record.clone());
            if previous.as_ref().is_some_and(UploadRecord::is_terminal) {
                // The state machine never does this; a caller replacing a
                // terminal record is reopening a key that should stay closed.
                tracing::warn!(%key, "replacing a terminal upload record");
            }
            let settle = if record.is_terminal() {
                registry.signals.remove(&key).map(|signal| (signal, record.clone()))
            } else {
                None
            };
            let event = match &record {
                UploadRecord::Uploading {
                    sent_bytes,
                    total_bytes,
                    ..
                } => {
                    if known {
                        UploadEvent::Progress(key.clone(), *sent_bytes, *total_bytes)
                    } else {
                        UploadEvent::Registered(key.clone())
                    }
                }
                UploadRecord::Complete { url } => UploadEvent::Completed(key.clone(), url.clone()),
                UploadRecord::Error { message, .. } => {
                    UploadEvent::Failed(key.clone(), message.clone())
                }
            };
            (event, settle)
        };

        tracing::debug!(%key, event = %event, "upload store updated");
        // No subscribers is the common case outside a UI; not an error.
        let _ = self.events.send(event);
        if let Some((signal, record)) = settle {
            signal.settle(record);
        }
    }

    /// Tolerant accessor: `None` for unknown keys.
    pub fn get(&self, key: &RefKey) -> Option<UploadRecord> {
        self.registry.read().records.get(key).cloned()
    }

    /// Strict accessor for callers that know the key must exist. A miss is a
    /// local contract violation, not a runtime condition, and fails fast.
    pub fn lookup(&self, key: &RefKey) -> Result<UploadRecord, AttacheError> {
        self.get(key).ok_or_else(|| {
            AttacheError::NotFound(format!("no upload record registered for key '{key}'"))
        })
    }

    /// Finish handle for `key`, if the key has ever been registered.
    pub fn finish(&self, key: &RefKey) -> Option<Finish> {
        self.registry.read().finishes.get(key).cloned()
    }

    /// Point-in-time copy of the registry. The resolver and save algorithm
    /// only ever read snapshots; the live store is never handed out.
    pub fn snapshot(&self) -> StoreSnapshot {
        let registry = self.registry.read();
        StoreSnapshot {
            records: registry.records.clone(),
            finishes: registry.finishes.clone(),
        }
    }

    /// Subscribe to change events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.registry.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.read().records.is_empty()
    }
}

/// Immutable view of the store at one instant. Records observed after the
/// snapshot was taken do not appear; the snapshot never changes.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    records: BTreeMap<RefKey, UploadRecord>,
    finishes: BTreeMap<RefKey, Finish>,
}

impl StoreSnapshot {
    pub fn record(&self, key: &RefKey) -> Option<&UploadRecord> {
        self.records.get(key)
    }

    pub fn finish(&self, key: &RefKey) -> Option<&Finish> {
        self.finishes.get(key)
    }

    pub fn records(&self) -> impl Iterator<Item = (&RefKey, &UploadRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn key(raw: &str) -> RefKey {
        RefKey::parse(raw)
    }

    #[test(tokio::test)]
    async fn set_on_unknown_key_creates_record_and_finish() {
        let store = UploadStore::new();
        let k = key("abc");
        store.set(k.clone(), UploadRecord::started("blob:a".to_string(), 10));

        assert!(store.get(&k).is_some());
        assert!(store.finish(&k).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test(tokio::test)]
    async fn lookup_miss_fails_fast() {
        let store = UploadStore::new();
        let err = store.lookup(&key("missing")).unwrap_err();
        assert!(matches!(err, AttacheError::NotFound(_)));
    }

    #[test(tokio::test)]
    async fn terminal_set_settles_finish_after_store_update() {
        let store = UploadStore::new();
        let k = key("abc");
        store.set(k.clone(), UploadRecord::started("blob:a".to_string(), 10));
        let finish = store.finish(&k).unwrap();

        let complete = UploadRecord::Complete {
            url: "/x.txt".to_string(),
        };
        store.set(k.clone(), complete.clone());

        assert_eq!(finish.settled().await, complete);
        // The store already held the terminal record when the waiter woke.
        assert_eq!(store.get(&k), Some(complete));
    }

    #[test(tokio::test)]
    async fn subscribers_see_register_progress_terminal_in_order() {
        let store = UploadStore::new();
        let mut events = store.subscribe();
        let k = key("abc");

        store.set(k.clone(), UploadRecord::started("blob:a".to_string(), 10));
        store.set(k.clone(), UploadRecord::progress("blob:a".to_string(), 4, 10));
        store.set(
            k.clone(),
            UploadRecord::Complete {
                url: "/x.txt".to_string(),
            },
        );

        assert_eq!(events.try_recv().unwrap(), UploadEvent::Registered(k.clone()));
        assert_eq!(
            events.try_recv().unwrap(),
            UploadEvent::Progress(k.clone(), 4, 10)
        );
        let terminal = events.try_recv().unwrap();
        assert!(terminal.is_terminal());
        assert_eq!(terminal.key(), &k);
        assert!(events.try_recv().is_err());
    }

    #[test(tokio::test)]
    async fn snapshot_is_isolated_from_later_writes() {
        let store = UploadStore::new();
        let k = key("abc");
        store.set(k.clone(), UploadRecord::started("blob:a".to_string(), 10));

        let snapshot = store.snapshot();
        store.set(
            k.clone(),
            UploadRecord::Complete {
                url: "/x.txt".to_string(),
            },
        );

        assert!(snapshot.record(&k).unwrap().is_uploading());
        assert!(store.get(&k).unwrap().is_terminal());
    }

    #[test(tokio::test)]
    async fn seeded_terminal_records_are_already_settled() {
        let complete = UploadRecord::Complete {
            url: "/x.txt".to_string(),
        };
        let store = UploadStore::with_records(vec![
            (key("done"), complete.clone()),
            (key("wip"), UploadRecord::started("blob:b".to_string(), 5)),
        ]);

        assert_eq!(store.finish(&key("done")).unwrap().settled().await, complete);
        assert!(store.finish(&key("wip")).unwrap().peek().is_none());
        assert_eq!(store.len(), 2);
    }

    #[test(tokio::test)]
    async fn clones_share_the_same_registry() {
        let store = UploadStore::new();
        let alias = store.clone();
        alias.set(key("abc"), UploadRecord::started("blob:a".to_string(), 10));
        assert_eq!(store.len(), 1);
    }
}
