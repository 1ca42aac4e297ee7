use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::key::RefKey;

/// Change notification emitted by the [UploadStore](crate::store::UploadStore)
/// whenever a key's record changes. Progress UIs subscribe to these and
/// re-read the store snapshot; upload progress never touches the document's
/// own edit history.
///
/// At most one terminal event (`Completed` or `Failed`) is emitted per key,
/// enforced by the store's consume-on-settle finish signal rather than by
/// convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadEvent {
    /// A new upload was registered for this key.
    Registered(RefKey),
    /// Sent/total byte counts for an in-flight upload.
    Progress(RefKey, u64, u64),
    /// The upload finished; the payload is the durable URL.
    Completed(RefKey, String),
    /// The upload failed; the payload is the transport's message.
    Failed(RefKey, String),
}

impl UploadEvent {
    pub fn key(&self) -> &RefKey {
        match self {
            UploadEvent::Registered(key) => key,
            UploadEvent::Progress(key, _, _) => key,
            UploadEvent::Completed(key, _) => key,
            UploadEvent::Failed(key, _) => key,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadEvent::Completed(_, _) | UploadEvent::Failed(_, _))
    }
}

impl Display for UploadEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            UploadEvent::Registered(_) => write!(f, "Registered"),
            UploadEvent::Progress(_, _, _) => write!(f, "Progress"),
            UploadEvent::Completed(_, _) => write!(f, "Completed"),
            UploadEvent::Failed(_, _) => write!(f, "Failed"),
        }
    }
}
