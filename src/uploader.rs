//! # Uploader - Per-File State Machine and Plugin Facade
//!
//! [Uploader] drives each dropped, pasted, or picked file through the upload
//! state sequence:
//!
//! ```text
//!  (start) --insert placeholder & register uploading(0, total)--> UPLOADING
//!  UPLOADING --progress(sent, total)--> UPLOADING
//!  UPLOADING --transport success--> COMPLETE
//!  UPLOADING --transport failure--> ERROR
//! ```
//!
//! `COMPLETE` and `ERROR` are terminal. There is no cancellation and no
//! automatic retry; a retry is a new [Uploader::upload_file] call with a
//! fresh key, and a save timeout never stops the transport task, which keeps
//! running and settles into the store later.
//!
//! The two collaborators the state machine depends on are injected as traits:
//! [UploadTransport] (the wire, e.g. a presigned-POST client) and
//! [DocumentEdit] (the editing surface that owns node insertion).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::UploadConfig,
    document::{Location, ReferenceNode},
    key::{KeyGenerator, RefKey, UuidKeyGenerator},
    record::UploadRecord,
    save::{save, SaveOptions, SaveOutcome},
    store::UploadStore,
};

/// One file handed to the plugin: contents plus the local preview URL the
/// editor renders while the upload is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Local/blob preview URL, not durable.
    pub preview_url: String,
}

impl FilePayload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the transport reports back. Expected network failures are data, not
/// `Err`: a malformed or unexpected response shape must be mapped into
/// [`TransportOutcome::Error`] by the implementation, the same as any other
/// transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportOutcome {
    /// `url` must be the durable location, path or absolute, so it always
    /// contains `/`. A bare identifier would lose its durable form when the
    /// materialized document is serialized and re-parsed.
    Success { url: String },
    Error { message: String },
}

/// The wire. The core does not know whether this is a presigned POST to a
/// blob store or anything else; it only needs this shape.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Upload one file, reporting progress as `(sent_bytes, total_bytes)` in
    /// delivery order.
    async fn upload(
        &self,
        file: &FilePayload,
        on_progress: &(dyn Fn(u64, u64) + Send + Sync),
    ) -> TransportOutcome;
}

/// The document-editing surface. Node shape and insertion mechanics belong to
/// the editor; the core only relies on the timing contract of
/// [DocumentEdit::insert_placeholder].
pub trait DocumentEdit<N>: Send + Sync {
    /// Insert a placeholder node referencing `key` at the caller-supplied
    /// location, else the current selection, else the document start. Called
    /// synchronously before the network work begins, so the node exists in
    /// the document by the time anything awaits.
    fn insert_placeholder(&self, key: &RefKey, file: &FilePayload, at: Option<&Location>);

    /// Current children of the document root.
    fn children(&self) -> Vec<N>;
}

/// Upload plugin core for one editor session. Owns the session's
/// [UploadStore] and spawns one independent tokio task per upload; no two
/// uploads contend for a lock.
pub struct Uploader<N> {
    store: UploadStore,
    transport: Arc<dyn UploadTransport>,
    document: Arc<dyn DocumentEdit<N>>,
    keys: Arc<dyn KeyGenerator>,
    config: UploadConfig,
}

impl<N: ReferenceNode + Send + 'static> Uploader<N> {
    pub fn new(
        store: UploadStore,
        transport: Arc<dyn UploadTransport>,
        document: Arc<dyn DocumentEdit<N>>,
    ) -> Uploader<N> {
        Uploader {
            store,
            transport,
            document,
            keys: Arc::new(UuidKeyGenerator),
            config: UploadConfig::default(),
        }
    }

    pub fn with_config(mut self, config: UploadConfig) -> Uploader<N> {
        self.config = config;
        self
    }

    pub fn with_key_generator(mut self, keys: Arc<dyn KeyGenerator>) -> Uploader<N> {
        self.keys = keys;
        self
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Start uploading `file`. Fire-and-forget: the placeholder node and the
    /// `Uploading` record exist when this returns, and the transport runs in
    /// a spawned task. Must be called within a tokio runtime.
    pub fn upload_file(&self, file: FilePayload, at: Option<Location>) -> RefKey {
        let key = self.keys.generate();

        // The placeholder goes in synchronously, before any await: the
        // resolver and save logic rely on the node referencing the key by
        // the time the network call starts.
        self.document.insert_placeholder(&key, &file, at.as_ref());
        self.store.set(
            key.clone(),
            UploadRecord::started(file.preview_url.clone(), file.size()),
        );

        if let Some(max) = self.config.max_file_bytes {
            if file.size() > max {
                tracing::warn!(key = %key, size = file.size(), max, "file exceeds size limit");
                self.store.set(
                    key.clone(),
                    UploadRecord::Error {
                        preview_url: file.preview_url,
                        message: format!("file exceeds the {max} byte upload limit"),
                    },
                );
                return key;
            }
        }

        tracing::info!(key = %key, name = %file.name, size = file.size(), "starting upload");
        let store = self.store.clone();
        let transport = Arc::clone(&self.transport);
        let task_key = key.clone();
        tokio::spawn(async move {
            let progress_store = store.clone();
            let progress_key = task_key.clone();
            let preview_url = file.preview_url.clone();
            let on_progress = move |sent: u64, total: u64| {
                progress_store.set(
                    progress_key.clone(),
                    UploadRecord::progress(preview_url.clone(), sent, total),
                );
            };

            match transport.upload(&file, &on_progress).await {
                TransportOutcome::Success { url } => {
                    tracing::info!(key = %task_key, %url, "upload complete");
                    store.set(task_key, UploadRecord::Complete { url });
                }
                TransportOutcome::Error { message } => {
                    tracing::warn!(key = %task_key, %message, "upload failed");
                    store.set(
                        task_key,
                        UploadRecord::Error {
                            preview_url: file.preview_url,
                            message,
                        },
                    );
                }
            }
        });
        key
    }

    /// Reconcile and snapshot the current document: wait (bounded) for its
    /// in-flight uploads, then materialize. See [crate::save::save].
    pub async fn save(&self, options: SaveOptions) -> SaveOutcome<N> {
        save(&self.document.children(), &self.store, options).await
    }

    /// Synchronous materialize of the current document, no waiting.
    pub fn normalize(&self) -> Vec<N> {
        crate::save::normalize(&self.document.children(), &self.store)
    }
}
