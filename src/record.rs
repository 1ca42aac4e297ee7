//! The per-upload data model: [UploadRecord], the three-state tagged union
//! tracked by the [UploadStore](crate::store::UploadStore), and the
//! [Finish]/[FinishSignal] pair that settles exactly once with the record's
//! terminal state.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The tracked state of one ephemeral-key upload.
///
/// Created in [`UploadRecord::Uploading`] with `sent_bytes = 0`, replaced
/// wholesale on every progress tick, and replaced once more on the terminal
/// transition. `Complete` and `Error` are terminal; a record is never
/// resurrected for the same key. A retry is a new upload with a new key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadRecord {
    /// Transport still in flight. `preview_url` is a local/blob preview, not
    /// durable. Invariant: `sent_bytes <= total_bytes`.
    Uploading {
        preview_url: String,
        sent_bytes: u64,
        total_bytes: u64,
    },
    /// Upload finished; `url` is the durable location in the remote store.
    Complete { url: String },
    /// Transport failed with a human-readable message. Never retried by the
    /// core itself.
    Error { preview_url: String, message: String },
}

impl UploadRecord {
    /// Fresh record for an upload that is about to start.
    pub fn started(preview_url: String, total_bytes: u64) -> UploadRecord {
        UploadRecord::Uploading {
            preview_url,
            sent_bytes: 0,
            total_bytes,
        }
    }

    /// Record for a progress tick. `sent` is clamped to `total` so the
    /// `sent_bytes <= total_bytes` invariant holds whatever the transport
    /// reports.
    pub fn progress(preview_url: String, sent: u64, total: u64) -> UploadRecord {
        UploadRecord::Uploading {
            preview_url,
            sent_bytes: sent.min(total),
            total_bytes: total,
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadRecord::Uploading { .. })
    }

    /// True for `Complete` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !self.is_uploading()
    }

    /// The URL this record currently renders as: the durable URL once
    /// complete, the local preview otherwise.
    pub fn url(&self) -> &str {
        match self {
            UploadRecord::Uploading { preview_url, .. } => preview_url,
            UploadRecord::Complete { url } => url,
            UploadRecord::Error { preview_url, .. } => preview_url,
        }
    }
}

/// Create the two-part finish handle for one upload: the consume-on-settle
/// [FinishSignal] held by the store, and the clonable [Finish] waiters use.
pub(crate) fn finish_channel() -> (FinishSignal, Finish) {
    let (tx, rx) = watch::channel(None);
    (FinishSignal { tx }, Finish { rx })
}

/// Sender half of the finish handle. Settling consumes the signal, so each
/// upload settles at most once no matter how many progress updates preceded
/// the terminal transition.
#[derive(Debug)]
pub(crate) struct FinishSignal {
    tx: watch::Sender<Option<UploadRecord>>,
}

impl FinishSignal {
    /// Resolve every waiting [Finish] with the terminal record. Waiters may
    /// have gone away (an abandoned document); that is not an error.
    pub(crate) fn settle(self, record: UploadRecord) {
        debug_assert!(record.is_terminal());
        let _ = self.tx.send(Some(record));
    }
}

/// Awaitable handle on one upload's terminal state.
///
/// [`Finish::settled`] resolves exactly once per upload, to the record's own
/// terminal state. It never "rejects": transport failure settles it with the
/// [`UploadRecord::Error`] record, so racing many finishes cannot abort early.
/// Clones share the same underlying signal and may be awaited concurrently.
#[derive(Debug, Clone)]
pub struct Finish {
    rx: watch::Receiver<Option<UploadRecord>>,
}

impl Finish {
    /// Wait for the upload to reach its terminal state and return that record.
    pub async fn settled(&self) -> UploadRecord {
        let mut rx = self.rx.clone();
        let settled = match rx.wait_for(|record| record.is_some()).await {
            Ok(settled) => settled.clone(),
            // The signal was dropped without settling: the upload task was
            // torn down before the transport reported back.
            Err(_) => None,
        };
        match settled {
            Some(record) => record,
            None => Finish::abandoned(),
        }
    }

    /// Terminal state reported without waiting, if the upload already settled.
    pub fn peek(&self) -> Option<UploadRecord> {
        self.rx.borrow().clone()
    }

    fn abandoned() -> UploadRecord {
        UploadRecord::Error {
            preview_url: String::new(),
            message: "upload abandoned before finishing".to_string(),
        }
    }
}
