//! # attache-core
//!
//! A Rust library for tracking asynchronous file uploads attached to a rich-text
//! document and reconciling them back into the document on save.
//!
//! The name "attache" comes from "attaché" - the one who carries the documents.
//!
//! ## Overview
//!
//! attache-core is the engine of an editor upload plugin: users drop, paste, or
//! pick files; the core hands them to a transport collaborator, tracks per-upload
//! progress in a session-scoped [store](store::UploadStore) kept **outside the
//! document's edit history**, and rewrites document references from ephemeral keys
//! to durable URLs when the document is saved.
//!
//! ### Key Features
//!
//! - **Three-state upload records**: a closed `uploading` / `complete` / `error`
//!   sum type, replaced wholesale on every transition
//! - **Session-scoped store**: keyed registry with change notification, never a
//!   process-wide global; one per editor instance
//! - **Settle-once finish handles**: every upload resolves exactly once, and
//!   never "rejects" - failures settle as data
//! - **Bounded save**: race in-flight uploads against a timeout and return a
//!   fully materialized document copy either way
//! - **Editor-agnostic tree walks**: the resolver sees only a minimal
//!   "node with optional reference key and ordered children" abstraction
//!
//! ## Architecture
//!
//! The library is organized around several key components:
//!
//! - **[`key`]**: reference keys (`RefKey`), durable vs. ephemeral form
//! - **[`record`]**: the per-upload data model and finish handles
//! - **[`store`]**: the upload registry with snapshots and subscriptions
//! - **[`resolver`]**: collect-pending and materialize tree walks
//! - **[`save`]**: the race-against-timeout save algorithm and `normalize`
//! - **[`uploader`]**: the per-file state machine and plugin facade
//! - **[`document`]**: the minimal document abstraction ([`document::Block`]
//!   is a ready-made implementation)
//!
//! ## Quick Start
//!
//! Resolve a document against a store snapshot:
//!
//! ```rust
//! use attache_core::document::Block;
//! use attache_core::key::RefKey;
//! use attache_core::record::UploadRecord;
//! use attache_core::save::normalize;
//! use attache_core::store::UploadStore;
//!
//! let store = UploadStore::new();
//! store.set(
//!     RefKey::parse("abc123"),
//!     UploadRecord::Complete { url: "/files/photo.png".to_string() },
//! );
//!
//! let document = vec![
//!     Block::text("hello"),
//!     Block::attachment(RefKey::parse("abc123")),
//! ];
//! let saved = normalize(&document, &store);
//! assert_eq!(saved[1].reference, Some(RefKey::parse("/files/photo.png")));
//! ```
//!
//! Drive a full upload through the facade:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use attache_core::document::Block;
//! use attache_core::save::SaveOptions;
//! use attache_core::uploader::{FilePayload, Uploader};
//! use attache_core::store::UploadStore;
//! # use attache_core::uploader::{DocumentEdit, UploadTransport};
//! # fn editor() -> Arc<dyn DocumentEdit<Block>> { unimplemented!() }
//! # fn transport() -> Arc<dyn UploadTransport> { unimplemented!() }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let uploader = Uploader::new(UploadStore::new(), transport(), editor());
//!
//!     // Fire-and-forget: the placeholder node and uploading record exist
//!     // as soon as this returns.
//!     let key = uploader.upload_file(
//!         FilePayload {
//!             name: "photo.png".to_string(),
//!             content_type: "image/png".to_string(),
//!             bytes: vec![0; 1024],
//!             preview_url: "blob:local-preview".to_string(),
//!         },
//!         None,
//!     );
//!
//!     // Progress UI: subscribe to store events for this key.
//!     let mut events = uploader.store().subscribe();
//!     let _ = events.recv().await;
//!     let _ = key;
//!
//!     // Persist: wait (bounded) for in-flight uploads, then materialize.
//!     // Every surviving reference in the value is a durable URL.
//!     let outcome = uploader.save(SaveOptions::default()).await;
//!     let _saved: Vec<Block> = outcome.into_value();
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Reference keys
//!
//! A document node references its attachment through a string key in one of
//! two forms, decided once at creation: **durable** (contains `/`, already a
//! URL, never looked up) or **ephemeral** (opaque local id, resolved through
//! the store). Only the resolution of an ephemeral key changes over time.
//!
//! ### Save semantics
//!
//! [`save::save`] snapshots the store, waits for the document's in-flight
//! uploads up to a timeout, re-snapshots, and returns a materialized copy in
//! which completed uploads are inlined and unresolvable references are
//! dropped. A timeout returns the still-pending finish handles so the caller
//! can keep waiting; the underlying uploads are never cancelled.
//!
//! ### What this crate is not
//!
//! Not a document model, not a storage backend, not a CRDT. It assumes a
//! single editing session in a single process; the editing surface and the
//! wire protocol live behind the [`uploader::DocumentEdit`] and
//! [`uploader::UploadTransport`] traits.

pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod key;
pub mod record;
pub mod resolver;
pub mod save;
pub mod store;
#[cfg(test)]
mod tests;
pub mod uploader;

pub use error::*;
