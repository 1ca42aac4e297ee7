//! [crate::key] contains [RefKey], the string form attached to document nodes that
//! identifies an uploaded (or uploading) file, and the [KeyGenerator] used to mint
//! fresh ephemeral keys for new uploads.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use uuid::Uuid;

/// A reference key carried by a document node, identifying an attached file.
///
/// Two disjoint forms, decided once when the key string is created and never
/// mutated afterwards:
///
/// - [`RefKey::Durable`]: contains a path separator (`/`) and is already a
///   resolvable URL (previously saved, or pasted as a raw URL). Durable keys
///   are never looked up in the [`UploadStore`](crate::store::UploadStore).
/// - [`RefKey::Ephemeral`]: an opaque locally generated identifier with no
///   separator. Resolution goes through the store, and only the resolution
///   changes over time; the key itself does not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RefKey {
    Durable(String),
    Ephemeral(String),
}

impl RefKey {
    /// Classify a raw key string by shape. A `/` anywhere in the string marks
    /// the durable (URL) form; everything else is an ephemeral lookup key.
    pub fn parse(raw: &str) -> RefKey {
        if raw.contains('/') {
            RefKey::Durable(raw.to_string())
        } else {
            RefKey::Ephemeral(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RefKey::Durable(s) => s,
            RefKey::Ephemeral(s) => s,
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, RefKey::Durable(_))
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, RefKey::Ephemeral(_))
    }
}

impl From<String> for RefKey {
    fn from(raw: String) -> RefKey {
        RefKey::parse(&raw)
    }
}

impl From<&str> for RefKey {
    fn from(raw: &str) -> RefKey {
        RefKey::parse(raw)
    }
}

impl From<RefKey> for String {
    fn from(key: RefKey) -> String {
        match key {
            RefKey::Durable(s) => s,
            RefKey::Ephemeral(s) => s,
        }
    }
}

impl FromStr for RefKey {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(RefKey::parse(raw))
    }
}

impl Display for RefKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Produces fresh ephemeral keys, collision-free within an editor session.
/// Every upload gets its own key; re-uploading the same logical file mints a
/// new one rather than reopening a terminal record.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> RefKey;
}

/// Default [KeyGenerator] backed by UUIDv4 in simple (hyphen-free) form, so
/// generated keys never contain a path separator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn generate(&self) -> RefKey {
        RefKey::Ephemeral(Uuid::new_v4().simple().to_string())
    }
}
