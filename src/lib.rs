//! Polygraph Features - stimulus-interval feature extraction.
//!
//! This library extracts per-channel features from multi-channel
//! physiological recordings over the stimulus intervals marked in an event
//! log, and aggregates them into a column-ordered table.
//!
//! # Features
//!
//! For every interval and every channel two values are computed:
//!
//! - **Line length**: sum of absolute first differences of the segment after
//!   z-normalizing it with its own mean and standard deviation
//! - **Mean**: arithmetic mean of the raw segment, in original units
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Polygraph Features                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ Log Parser  │──▶│  Interval   │──▶│  Features   │       │
//! │  │ (5/6 pairs) │   │   Mapper    │   │ (per chan)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                 ▲                  │              │
//! │         │          ┌─────────────┐           ▼              │
//! │  ┌─────────────┐   │   Signal    │   ┌─────────────┐       │
//! │  │    Batch    │──▶│   Source    │   │   Feature   │       │
//! │  │   Runner    │   └─────────────┘   │    Table    │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use polygraph_features::core::{parse_log, process_session, Session};
//!
//! let signal: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.05).sin()).collect();
//! let session = Session::new(vec![signal], vec!["Resp".to_string()], 100.0).unwrap();
//!
//! let parsed = parse_log("2.0 x 5 question\n4.0 x 6\n");
//! let outcome = process_session("s01", &session, &parsed.intervals);
//!
//! let record = &outcome.records()[0];
//! assert_eq!(record.duration, 2.0);
//! assert_eq!((record.range.start, record.range.end), (200, 400));
//! ```

pub mod batch;
pub mod config;
pub mod core;
pub mod report;
pub mod runlog;
pub mod source;

// Re-export key types at crate root for convenience
pub use batch::{BatchError, BatchReport, BatchRunner, SessionResult};
pub use config::{Config, ConfigError};
pub use core::{
    parse_log, parse_log_file, process_session, FeatureRecord, ParsedLog, SampleRange, Session,
    SessionOutcome, StimulusInterval,
};
pub use report::{FeatureTable, FileSink, OutputFormat, TableSink};
pub use runlog::{RunLog, RunStats, SharedRunLog};
pub use source::{discover_sessions, JsonSessionSource, SignalSource, SourceError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
