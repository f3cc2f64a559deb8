//! Core feature-extraction pipeline.
//!
//! This module contains:
//! - Event log parsing into stimulus intervals
//! - Time-to-sample interval mapping
//! - Per-channel feature computation
//! - Session processing into feature records

pub mod features;
pub mod intervals;
pub mod log_parser;
pub mod session;

// Re-export commonly used types
pub use features::{channel_features, line_length, mean, z_normalize, ChannelFeatures};
pub use intervals::{map_interval, RangeRejection, SampleRange};
pub use log_parser::{
    parse_log, parse_log_file, LogEvent, ParseWarning, ParsedLog, StimulusInterval,
    MARKER_END, MARKER_START,
};
pub use session::{
    process_session, FeatureRecord, RejectedInterval, Session, SessionError, SessionOutcome,
    SkipReason,
};
