//! Shared test utilities for upload tracking tests

use crate::{document::Block, key::RefKey, record::UploadRecord, store::UploadStore};

pub fn complete(url: &str) -> UploadRecord {
    UploadRecord::Complete {
        url: url.to_string(),
    }
}

pub fn uploading(sent: u64, total: u64) -> UploadRecord {
    UploadRecord::progress("blob:preview".to_string(), sent, total)
}

pub fn failed(message: &str) -> UploadRecord {
    UploadRecord::Error {
        preview_url: "blob:preview".to_string(),
        message: message.to_string(),
    }
}

/// Store seeded with `(key, record)` pairs, keys parsed from strings.
pub fn seeded_store(records: Vec<(&str, UploadRecord)>) -> UploadStore {
    UploadStore::with_records(
        records
            .into_iter()
            .map(|(key, record)| (RefKey::parse(key), record)),
    )
}

/// Document with one attachment per key plus a text leaf.
pub fn doc_with_attachments(keys: &[&str]) -> Vec<Block> {
    let mut nodes = vec![Block::text("intro")];
    nodes.extend(keys.iter().map(|key| Block::attachment(RefKey::parse(key))));
    nodes
}
