//! Append-only record of delivered diagnostic artifacts.
//!
//! The pipeline appends exactly one entry per successfully delivered
//! artifact; entries are never mutated or removed here. Long-term
//! persistence and retrieval belong to the embedder — the JSONL
//! implementation below is a convenience for processes that want a durable
//! log without wiring their own store.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use tracing::error;

/// Where a delivered artifact can be retrieved from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Url(String),
    File(PathBuf),
}

/// One delivered artifact. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEntry {
    /// Identity snapshot of whoever triggered the capture.
    pub actor: String,
    pub timestamp_millis: i64,
    /// e.g. "Heap dump" or "Heap dump summary".
    pub label: String,
    pub locator: Locator,
}

/// Append-only activity store.
pub trait ActivityLog: Send + Sync {
    fn record(&self, entry: ActivityEntry);
}

/// In-memory log for tests and short-lived embedders.
#[derive(Debug, Default)]
pub struct MemoryActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().expect("activity mutex poisoned").clone()
    }
}

impl ActivityLog for MemoryActivityLog {
    fn record(&self, entry: ActivityEntry) {
        self.entries
            .lock()
            .expect("activity mutex poisoned")
            .push(entry);
    }
}

/// Appends entries as JSON lines to a file, creating it on first write.
/// Failures are logged rather than surfaced: bookkeeping must never take
/// down a delivery that already succeeded.
#[derive(Debug)]
pub struct JsonlActivityLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ActivityLog for JsonlActivityLog {
    fn record(&self, entry: ActivityEntry) {
        let _guard = self.write_lock.lock().expect("activity mutex poisoned");

        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(err) => {
                error!("failed to encode activity entry: {err}");
                return;
            }
        };

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(err) = result {
            error!(
                "failed to append activity entry to {}: {err}",
                self.path.display()
            );
        }
    }
}
