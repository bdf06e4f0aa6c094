//! Scan progress reporting.
//!
//! The scanner calls [`ProgressSink::report_progress`] synchronously at fixed
//! points of the pipeline. Where the updates go is up to the caller:
//! [`ProgressStore`] keeps the latest update per scan for polling, and
//! [`LogProgress`] just logs them.

use std::sync::Arc;

use moka::sync::Cache;
use serde::{Deserialize, Serialize};

use crate::config::{PROGRESS_STORE_CAPACITY, PROGRESS_TTL};

/// Lifecycle state of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Running,
    Completed,
}

/// One progress update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub status: ProgressStatus,
    /// Pipeline phase name
    pub phase: String,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl ProgressUpdate {
    /// A running-phase update.
    pub fn running(phase: &str, current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::Running,
            phase: phase.to_string(),
            current,
            total,
            message: message.into(),
        }
    }

    /// The final update of a scan.
    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::Completed,
            phase: "completed".to_string(),
            current: 1,
            total: 1,
            message: message.into(),
        }
    }
}

/// Receives progress updates. Fire-and-forget: implementations must not block
/// for long and cannot fail the scan.
pub trait ProgressSink: Send + Sync {
    fn report_progress(&self, scan_id: &str, update: ProgressUpdate);
}

/// Keeps the latest update per scan id. Entries expire when unread for
/// [`PROGRESS_TTL`].
#[derive(Clone)]
pub struct ProgressStore {
    entries: Cache<String, ProgressUpdate>,
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::with_ttl(PROGRESS_TTL)
    }

    /// A store with a custom idle TTL.
    pub fn with_ttl(ttl: std::time::Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(PROGRESS_STORE_CAPACITY)
                .time_to_idle(ttl)
                .build(),
        }
    }

    /// Latest update for `scan_id`, if it has not expired.
    pub fn get_progress(&self, scan_id: &str) -> Option<ProgressUpdate> {
        self.entries.get(scan_id)
    }
}

impl ProgressSink for ProgressStore {
    fn report_progress(&self, scan_id: &str, update: ProgressUpdate) {
        self.entries.insert(scan_id.to_string(), update);
    }
}

/// Logs every update at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report_progress(&self, scan_id: &str, update: ProgressUpdate) {
        log::info!(
            "[{}] {} {}/{}: {}",
            scan_id,
            update.phase,
            update.current,
            update.total,
            update.message
        );
    }
}

/// Forwards each update to several sinks.
#[derive(Clone, Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl FanOut {
    pub fn new(sinks: Vec<Arc<dyn ProgressSink>>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for FanOut {
    fn report_progress(&self, scan_id: &str, update: ProgressUpdate) {
        for sink in &self.sinks {
            sink.report_progress(scan_id, update.clone());
        }
    }
}
