//! Batch processing across sessions.
//!
//! Each session is handled in isolation: a missing log, a broken signal file
//! or an empty log skips that session and the batch moves on. Records are
//! accumulated in session-identifier order, then in log order.

use crate::config::Config;
use crate::core::log_parser::{parse_log_file, ParseWarning};
use crate::core::session::{process_session, FeatureRecord, SessionOutcome, SkipReason};
use crate::report::{FeatureTable, ReportError, TableSink};
use crate::runlog::SharedRunLog;
use crate::source::SignalSource;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one session within a batch.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub session_id: String,
    pub outcome: SessionOutcome,
    /// Problems found while parsing the session's log
    pub log_warnings: Vec<ParseWarning>,
}

/// Drives the pipeline over many sessions.
pub struct BatchRunner<'a, S: SignalSource + ?Sized> {
    source: &'a S,
    log_dir: PathBuf,
    log_extension: String,
    run_log: Option<SharedRunLog>,
}

impl<'a, S: SignalSource + ?Sized> BatchRunner<'a, S> {
    pub fn new(source: &'a S, log_dir: impl Into<PathBuf>, log_extension: &str) -> Self {
        Self {
            source,
            log_dir: log_dir.into(),
            log_extension: log_extension.trim_start_matches('.').to_string(),
            run_log: None,
        }
    }

    /// Runner reading logs from the configured log directory.
    pub fn from_config(source: &'a S, config: &Config) -> Self {
        Self::new(source, &config.log_dir, &config.log_extension)
    }

    /// Count what the batch does in a shared run log.
    pub fn with_run_log(mut self, run_log: SharedRunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    /// Stimulus log path for a session.
    pub fn log_path(&self, session_id: &str) -> PathBuf {
        self.log_dir.join(format!("{session_id}.{}", self.log_extension))
    }

    /// Process a single session.
    pub fn process_one(&self, session_id: &str) -> SessionResult {
        let span = tracing::info_span!("session", id = session_id);
        let _guard = span.enter();

        let (outcome, log_warnings) = self.run_session(session_id);

        match &outcome {
            SessionOutcome::Processed { records, rejected } => {
                tracing::info!(records = records.len(), "session processed");
                if let Some(ref log) = self.run_log {
                    log.record_session_processed();
                    log.record_records_emitted(records.len() as u64);
                    log.record_intervals_rejected(rejected.len() as u64);
                }
            }
            SessionOutcome::Skipped { reason } => {
                tracing::warn!("session skipped: {reason}");
                if let Some(ref log) = self.run_log {
                    log.record_session_skipped();
                }
            }
        }
        if let Some(ref log) = self.run_log {
            log.record_warnings(log_warnings.len() as u64);
        }

        SessionResult {
            session_id: session_id.to_string(),
            outcome,
            log_warnings,
        }
    }

    fn run_session(&self, session_id: &str) -> (SessionOutcome, Vec<ParseWarning>) {
        let log_path = self.log_path(session_id);
        if !log_path.exists() {
            return (
                SessionOutcome::Skipped {
                    reason: SkipReason::MissingLog(log_path.display().to_string()),
                },
                Vec::new(),
            );
        }

        let session = match self.source.load(session_id) {
            Ok(session) => session,
            Err(e) => {
                return (
                    SessionOutcome::Skipped {
                        reason: SkipReason::SourceFailed(e.to_string()),
                    },
                    Vec::new(),
                )
            }
        };
        tracing::debug!(
            channels = session.channel_count(),
            samples = session.sample_count(),
            rate = session.sampling_rate(),
            "signals loaded"
        );

        let parsed = parse_log_file(&log_path);
        if let Some(ref log) = self.run_log {
            log.record_intervals_parsed(parsed.intervals.len() as u64);
        }

        let outcome = process_session(session_id, &session, &parsed.intervals);
        (outcome, parsed.warnings)
    }

    /// Process sessions in identifier order.
    pub fn run(&self, session_ids: &[String]) -> BatchReport {
        let mut ids: Vec<&String> = session_ids.iter().collect();
        ids.sort();
        ids.dedup();

        let sessions = ids.into_iter().map(|id| self.process_one(id)).collect();
        BatchReport { sessions }
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub sessions: Vec<SessionResult>,
}

impl BatchReport {
    /// All records in output order.
    pub fn records(&self) -> Vec<FeatureRecord> {
        self.sessions
            .iter()
            .flat_map(|s| s.outcome.records().iter().cloned())
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.sessions.iter().map(|s| s.outcome.records().len()).sum()
    }

    /// Sessions that were skipped, with the reason.
    pub fn skipped(&self) -> Vec<(&str, &SkipReason)> {
        self.sessions
            .iter()
            .filter_map(|s| match &s.outcome {
                SessionOutcome::Skipped { reason } => Some((s.session_id.as_str(), reason)),
                SessionOutcome::Processed { .. } => None,
            })
            .collect()
    }

    /// Number of sessions that contributed at least one record.
    pub fn contributing_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| !s.outcome.records().is_empty())
            .count()
    }

    pub fn table(&self) -> FeatureTable {
        FeatureTable::from_records(&self.records())
    }

    /// Lay out the records and hand them to the sink.
    ///
    /// The sink is not invoked when no session produced a record.
    pub fn write_to(&self, sink: &mut dyn TableSink) -> Result<FeatureTable, BatchError> {
        if self.record_count() == 0 {
            return Err(BatchError::NoRecords {
                sessions: self.sessions.len(),
            });
        }

        let table = self.table();
        sink.write_table(&table).map_err(BatchError::Report)?;
        Ok(table)
    }
}

/// Batch-level failures.
#[derive(Debug)]
pub enum BatchError {
    /// No session produced a record; nothing was written.
    NoRecords { sessions: usize },
    Report(ReportError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::NoRecords { sessions } => {
                write!(f, "No data to save: {sessions} session(s) produced no records")
            }
            BatchError::Report(e) => write!(f, "Could not write report: {e}"),
        }
    }
}

impl std::error::Error for BatchError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Session;
    use crate::runlog::create_shared_log;
    use crate::source::SourceError;
    use std::collections::HashMap;

    struct MemorySource(HashMap<String, Session>);

    impl SignalSource for MemorySource {
        fn load(&self, session_id: &str) -> Result<Session, SourceError> {
            self.0
                .get(session_id)
                .cloned()
                .ok_or_else(|| SourceError::NotFound(session_id.to_string()))
        }
    }

    #[derive(Default)]
    struct CountingSink {
        calls: usize,
        rows: usize,
    }

    impl TableSink for CountingSink {
        fn write_table(&mut self, table: &FeatureTable) -> Result<(), ReportError> {
            self.calls += 1;
            self.rows = table.row_count();
            Ok(())
        }
    }

    fn session() -> Session {
        let signal: Vec<f64> = (0..500).map(|i| (i as f64 * 0.1).cos()).collect();
        Session::new(vec![signal], vec!["Resp".into()], 50.0).unwrap()
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("polygraph-batch-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_failures_are_isolated() {
        let dir = scratch_dir();
        std::fs::write(dir.join("good.txt"), "1.0 x 5 a\n2.0 x 6\n3.0 x 5 b\n4.0 x 6\n").unwrap();
        std::fs::write(dir.join("empty.txt"), "").unwrap();
        std::fs::write(dir.join("unloadable.txt"), "1.0 x 5\n2.0 x 6\n").unwrap();

        let mut sessions = HashMap::new();
        sessions.insert("good".to_string(), session());
        sessions.insert("empty".to_string(), session());
        sessions.insert("nolog".to_string(), session());
        let source = MemorySource(sessions);

        let run_log = create_shared_log();
        let runner = BatchRunner::new(&source, &dir, "txt").with_run_log(run_log.clone());
        let ids: Vec<String> = ["unloadable", "nolog", "good", "empty"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let report = runner.run(&ids);

        let order: Vec<&str> = report.sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(order, vec!["empty", "good", "nolog", "unloadable"]);
        assert_eq!(report.record_count(), 2);
        assert_eq!(report.contributing_sessions(), 1);

        let skipped = report.skipped();
        assert_eq!(skipped.len(), 3);
        assert!(matches!(skipped[0], ("empty", SkipReason::NoIntervals)));
        assert!(matches!(skipped[1], ("nolog", SkipReason::MissingLog(_))));
        assert!(matches!(skipped[2], ("unloadable", SkipReason::SourceFailed(_))));

        let stats = run_log.stats();
        assert_eq!(stats.sessions_processed, 1);
        assert_eq!(stats.sessions_skipped, 3);
        assert_eq!(stats.records_emitted, 2);

        let mut sink = CountingSink::default();
        let table = report.write_to(&mut sink).unwrap();
        assert_eq!(sink.calls, 1);
        assert_eq!(sink.rows, 2);
        assert_eq!(table.columns()[5], "Resp_Line_Length");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_no_records_skips_sink() {
        let dir = scratch_dir();
        // Interval lies past the end of a 10 s recording.
        std::fs::write(dir.join("late.txt"), "20.0 x 5\n21.0 x 6\n").unwrap();

        let mut sessions = HashMap::new();
        sessions.insert("late".to_string(), session());
        let source = MemorySource(sessions);

        let report = BatchRunner::new(&source, &dir, ".txt").run(&["late".to_string()]);
        assert!(!report.sessions[0].outcome.is_skipped());

        let mut sink = CountingSink::default();
        assert!(matches!(
            report.write_to(&mut sink),
            Err(BatchError::NoRecords { sessions: 1 })
        ));
        assert_eq!(sink.calls, 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_log_warnings_are_attached() {
        let dir = scratch_dir();
        std::fs::write(dir.join("s.txt"), "1.0 x 5\n1.5 x 5\n2.0 x 6\nbad x 5\n").unwrap();

        let mut sessions = HashMap::new();
        sessions.insert("s".to_string(), session());
        let source = MemorySource(sessions);

        let report = BatchRunner::new(&source, &dir, "txt").run(&["s".to_string()]);
        assert_eq!(report.sessions[0].log_warnings.len(), 2);
        assert_eq!(report.record_count(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
