//! Batch run statistics.
//!
//! Tracks what a batch run did (sessions, intervals, records, warnings) and
//! persists the totals so `status` can show the most recent run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Counters for a single batch run.
#[derive(Debug)]
pub struct RunLog {
    /// Unique id of this run
    run_id: Uuid,
    /// Sessions that produced an outcome with records or rejections
    sessions_processed: AtomicU64,
    /// Sessions skipped entirely
    sessions_skipped: AtomicU64,
    /// Intervals recovered from logs
    intervals_parsed: AtomicU64,
    /// Intervals that did not map onto the signal
    intervals_rejected: AtomicU64,
    /// Feature records produced
    records_emitted: AtomicU64,
    /// Log-parse warnings
    warnings: AtomicU64,
    /// Run start time
    started_at: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            sessions_processed: AtomicU64::new(0),
            sessions_skipped: AtomicU64::new(0),
            intervals_parsed: AtomicU64::new(0),
            intervals_rejected: AtomicU64::new(0),
            records_emitted: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a run log that saves its totals to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);
        log
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record_session_processed(&self) {
        self.sessions_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_skipped(&self) {
        self.sessions_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_intervals_parsed(&self, count: u64) {
        self.intervals_parsed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_intervals_rejected(&self, count: u64) {
        self.intervals_rejected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_records_emitted(&self, count: u64) {
        self.records_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_warnings(&self, count: u64) {
        self.warnings.fetch_add(count, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RunStats {
        RunStats {
            run_id: self.run_id,
            sessions_processed: self.sessions_processed.load(Ordering::Relaxed),
            sessions_skipped: self.sessions_skipped.load(Ordering::Relaxed),
            intervals_parsed: self.intervals_parsed.load(Ordering::Relaxed),
            intervals_rejected: self.intervals_rejected.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            started_at: self.started_at,
            elapsed_ms: (Utc::now() - self.started_at).num_milliseconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        self.stats().to_string()
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let json =
                serde_json::to_string_pretty(&self.stats()).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub sessions_processed: u64,
    pub sessions_skipped: u64,
    pub intervals_parsed: u64,
    pub intervals_rejected: u64,
    pub records_emitted: u64,
    pub warnings: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl RunStats {
    /// Load the stats of a previous run.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(std::io::Error::other)
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Run {} ({}):\n\
             - Sessions processed: {}\n\
             - Sessions skipped: {}\n\
             - Intervals parsed: {}\n\
             - Intervals rejected: {}\n\
             - Records emitted: {}\n\
             - Log warnings: {}\n\
             - Elapsed: {} ms",
            self.run_id,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.sessions_processed,
            self.sessions_skipped,
            self.intervals_parsed,
            self.intervals_rejected,
            self.records_emitted,
            self.warnings,
            self.elapsed_ms
        )
    }
}

/// Thread-safe shared run log.
pub type SharedRunLog = Arc<RunLog>;

/// Create a new shared run log.
pub fn create_shared_log() -> SharedRunLog {
    Arc::new(RunLog::new())
}

/// Create a new shared run log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRunLog {
    Arc::new(RunLog::with_persistence(path))
}
