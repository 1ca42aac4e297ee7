//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```
//!
//! Provides a scripted in-memory transport and a recording document-edit
//! collaborator.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use attache_core::document::{Block, Location};
use attache_core::key::RefKey;
use attache_core::uploader::{DocumentEdit, FilePayload, TransportOutcome, UploadTransport};

/// One transport run: progress ticks, then the outcome, with optional delays
/// to keep an upload in flight past a save timeout.
pub struct Script {
    pub ticks: Vec<(u64, u64)>,
    pub tick_delay: Duration,
    pub outcome: TransportOutcome,
    pub outcome_delay: Duration,
}

impl Script {
    pub fn succeed(url: &str, ticks: Vec<(u64, u64)>) -> Script {
        Script {
            ticks,
            tick_delay: Duration::ZERO,
            outcome: TransportOutcome::Success {
                url: url.to_string(),
            },
            outcome_delay: Duration::ZERO,
        }
    }

    pub fn fail(message: &str) -> Script {
        Script {
            ticks: Vec::new(),
            tick_delay: Duration::ZERO,
            outcome: TransportOutcome::Error {
                message: message.to_string(),
            },
            outcome_delay: Duration::ZERO,
        }
    }

    /// Stays in flight long past any test timeout before succeeding.
    pub fn stall(url: &str) -> Script {
        Script {
            ticks: Vec::new(),
            tick_delay: Duration::ZERO,
            outcome: TransportOutcome::Success {
                url: url.to_string(),
            },
            outcome_delay: Duration::from_secs(300),
        }
    }

    pub fn delayed(mut self, outcome_delay: Duration) -> Script {
        self.outcome_delay = outcome_delay;
        self
    }
}

/// Transport scripted per file name. Unscripted files succeed immediately
/// with `/files/<name>`.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<BTreeMap<String, Script>>,
}

impl ScriptedTransport {
    pub fn new() -> ScriptedTransport {
        ScriptedTransport::default()
    }

    pub fn script(self, name: &str, script: Script) -> ScriptedTransport {
        self.scripts.lock().insert(name.to_string(), script);
        self
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn upload(
        &self,
        file: &FilePayload,
        on_progress: &(dyn Fn(u64, u64) + Send + Sync),
    ) -> TransportOutcome {
        let script = self.scripts.lock().remove(&file.name);
        let script = match script {
            Some(script) => script,
            None => Script::succeed(&format!("/files/{}", file.name), Vec::new()),
        };
        for (sent, total) in script.ticks {
            if !script.tick_delay.is_zero() {
                tokio::time::sleep(script.tick_delay).await;
            }
            on_progress(sent, total);
        }
        if !script.outcome_delay.is_zero() {
            tokio::time::sleep(script.outcome_delay).await;
        }
        script.outcome
    }
}

/// [DocumentEdit] impl that keeps the document in memory. Placeholders are
/// attachment [Block]s captioned with the file name; with no location the
/// node goes to the document start.
#[derive(Default)]
pub struct RecordingDocument {
    children: Mutex<Vec<Block>>,
}

impl RecordingDocument {
    pub fn new() -> RecordingDocument {
        RecordingDocument::default()
    }

    pub fn with_children(children: Vec<Block>) -> RecordingDocument {
        RecordingDocument {
            children: Mutex::new(children),
        }
    }
}

impl DocumentEdit<Block> for RecordingDocument {
    fn insert_placeholder(&self, key: &RefKey, file: &FilePayload, at: Option<&Location>) {
        let mut node = Block::attachment(key.clone());
        node.text = file.name.clone();
        let mut children = self.children.lock();
        let index = at
            .and_then(|location| location.first().copied())
            .unwrap_or(0)
            .min(children.len());
        children.insert(index, node);
    }

    fn children(&self) -> Vec<Block> {
        self.children.lock().clone()
    }
}
