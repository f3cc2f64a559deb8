//! Session processing.
//!
//! A [`Session`] is one multi-channel recording. [`process_session`] maps each
//! stimulus interval onto it and produces one [`FeatureRecord`] per interval
//! that fits inside the signal.

use crate::core::features::{channel_features, ChannelFeatures};
use crate::core::intervals::{map_interval, RangeRejection, SampleRange};
use crate::core::log_parser::StimulusInterval;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One multi-channel recording.
#[derive(Debug, Clone)]
pub struct Session {
    signals: Vec<Vec<f64>>,
    labels: Vec<String>,
    sampling_rate: f64,
}

impl Session {
    /// Build a session, checking that channels and labels line up.
    pub fn new(
        signals: Vec<Vec<f64>>,
        labels: Vec<String>,
        sampling_rate: f64,
    ) -> Result<Self, SessionError> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(SessionError::InvalidSamplingRate(sampling_rate));
        }
        if signals.len() != labels.len() {
            return Err(SessionError::LabelMismatch {
                channels: signals.len(),
                labels: labels.len(),
            });
        }
        if let Some(first) = signals.first() {
            let expected = first.len();
            if let Some((index, channel)) = signals
                .iter()
                .enumerate()
                .find(|(_, channel)| channel.len() != expected)
            {
                return Err(SessionError::RaggedChannels {
                    channel: labels[index].clone(),
                    expected,
                    actual: channel.len(),
                });
            }
        }
        {
            let mut seen = HashSet::new();
            if let Some(duplicate) = labels.iter().find(|label| !seen.insert(label.as_str())) {
                return Err(SessionError::DuplicateLabel(duplicate.clone()));
            }
        }

        Ok(Self {
            signals,
            labels,
            sampling_rate,
        })
    }

    pub fn signals(&self) -> &[Vec<f64>] {
        &self.signals
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Samples per second.
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn channel_count(&self) -> usize {
        self.signals.len()
    }

    /// Samples per channel.
    pub fn sample_count(&self) -> usize {
        self.signals.first().map(Vec::len).unwrap_or(0)
    }

    /// Recording length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.sample_count() as f64 / self.sampling_rate
    }
}

/// A session that cannot be processed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    InvalidSamplingRate(f64),
    LabelMismatch { channels: usize, labels: usize },
    RaggedChannels {
        channel: String,
        expected: usize,
        actual: usize,
    },
    DuplicateLabel(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidSamplingRate(rate) => {
                write!(f, "sampling rate must be positive, got {rate}")
            }
            SessionError::LabelMismatch { channels, labels } => {
                write!(f, "{channels} channels but {labels} channel labels")
            }
            SessionError::RaggedChannels {
                channel,
                expected,
                actual,
            } => write!(
                f,
                "channel '{channel}' has {actual} samples, expected {expected}"
            ),
            SessionError::DuplicateLabel(label) => write!(f, "duplicate channel label '{label}'"),
        }
    }
}

impl std::error::Error for SessionError {}

/// One output row: an interval of a session and its per-channel features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Session identifier
    pub session: String,
    pub label: Option<String>,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    /// Sample indices the features were computed on
    pub range: SampleRange,
    /// One entry per channel, in the session's label order
    pub channels: Vec<ChannelFeatures>,
}

impl FeatureRecord {
    /// Features for a channel by label.
    pub fn channel(&self, label: &str) -> Option<&ChannelFeatures> {
        self.channels.iter().find(|c| c.channel == label)
    }
}

/// An interval that was not turned into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedInterval {
    pub interval: StimulusInterval,
    pub reason: RangeRejection,
}

impl fmt::Display for RejectedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid interval '{}' {}s..{}s: {}",
            self.interval.label.as_deref().unwrap_or("<none>"),
            self.interval.start,
            self.interval.end,
            self.reason
        )
    }
}

/// Why a session contributed no records.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The paired log yielded no intervals.
    NoIntervals,
    /// No log file exists for the session.
    MissingLog(String),
    /// The signal data could not be loaded.
    SourceFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoIntervals => write!(f, "no intervals found in log"),
            SkipReason::MissingLog(path) => write!(f, "log file not found: {path}"),
            SkipReason::SourceFailed(e) => write!(f, "could not load signals: {e}"),
        }
    }
}

/// Result of processing one session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Processed {
        records: Vec<FeatureRecord>,
        rejected: Vec<RejectedInterval>,
    },
    Skipped { reason: SkipReason },
}

impl SessionOutcome {
    pub fn records(&self) -> &[FeatureRecord] {
        match self {
            SessionOutcome::Processed { records, .. } => records,
            SessionOutcome::Skipped { .. } => &[],
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SessionOutcome::Skipped { .. })
    }
}

/// Compute features for one interval that is already known to fit.
fn build_record(
    session_id: &str,
    session: &Session,
    interval: &StimulusInterval,
    range: SampleRange,
) -> FeatureRecord {
    let channels = session
        .labels
        .iter()
        .zip(&session.signals)
        .map(|(label, signal)| channel_features(label, range.slice(signal)))
        .collect();

    FeatureRecord {
        session: session_id.to_string(),
        label: interval.label.clone(),
        start_time: interval.start,
        end_time: interval.end,
        duration: interval.duration(),
        range,
        channels,
    }
}

/// Produce one record per interval that maps inside the session's signal.
pub fn process_session(
    session_id: &str,
    session: &Session,
    intervals: &[StimulusInterval],
) -> SessionOutcome {
    if intervals.is_empty() {
        tracing::warn!(session = session_id, "no intervals to process");
        return SessionOutcome::Skipped {
            reason: SkipReason::NoIntervals,
        };
    }

    let total_samples = session.sample_count();
    let mut records = Vec::with_capacity(intervals.len());
    let mut rejected = Vec::new();

    for interval in intervals {
        match map_interval(interval, session.sampling_rate, total_samples) {
            Ok(range) => records.push(build_record(session_id, session, interval, range)),
            Err(reason) => {
                let rejection = RejectedInterval {
                    interval: interval.clone(),
                    reason,
                };
                tracing::warn!(session = session_id, "{rejection}");
                rejected.push(rejection);
            }
        }
    }

    tracing::debug!(
        session = session_id,
        records = records.len(),
        rejected = rejected.len(),
        "session processed"
    );

    SessionOutcome::Processed { records, rejected }
}
