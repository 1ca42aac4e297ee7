use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate-wide error type.
///
/// Expected failure states never show up here: a network error becomes an
/// `Error` upload record, and a resolution miss silently drops the node.
/// `AttacheError` is reserved for contract violations (a strict store lookup
/// miss, malformed configuration) that fail fast at the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum AttacheError {
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<io::Error> for AttacheError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => AttacheError::NotFound(format!("{x}")),
            _ => AttacheError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<toml::de::Error> for AttacheError {
    fn from(src: toml::de::Error) -> AttacheError {
        AttacheError::Serialization(format!("Toml deserialization error: {src}"))
    }
}
