//! Time-to-sample mapping.
//!
//! Converts a [`StimulusInterval`] in seconds into a half-open range of
//! sample indices for a signal recorded at a fixed sampling rate.

use crate::core::log_parser::StimulusInterval;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open `[start, end)` range of sample indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    /// Number of samples covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Restrict a channel to this range.
    pub fn slice<'a>(&self, samples: &'a [f64]) -> &'a [f64] {
        &samples[self.start..self.end]
    }
}

impl fmt::Display for SampleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Why an interval could not be mapped onto the signal.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeRejection {
    /// The start time maps before the first sample.
    NegativeStart { start_index: i64 },
    /// The end time maps past the last sample.
    PastEnd { end_index: i64, total_samples: usize },
    /// The range would contain no samples.
    Empty { start_index: i64, end_index: i64 },
    /// A timestamp times the rate is NaN or infinite.
    NonFinite { start: f64, end: f64 },
}

impl fmt::Display for RangeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRejection::NegativeStart { start_index } => {
                write!(f, "start index {start_index} is negative")
            }
            RangeRejection::PastEnd {
                end_index,
                total_samples,
            } => write!(
                f,
                "end index {end_index} exceeds signal length {total_samples}"
            ),
            RangeRejection::Empty {
                start_index,
                end_index,
            } => write!(
                f,
                "start index {start_index} is not before end index {end_index}"
            ),
            RangeRejection::NonFinite { start, end } => {
                write!(f, "interval {start}s..{end}s has no finite sample position")
            }
        }
    }
}

/// Convert a time in seconds to a sample index, truncating toward zero.
fn to_index(time: f64, sampling_rate: f64) -> Option<i64> {
    let position = time * sampling_rate;
    if position.is_finite() {
        Some(position.trunc() as i64)
    } else {
        None
    }
}

/// Map an interval onto `total_samples` samples recorded at `sampling_rate` Hz.
pub fn map_interval(
    interval: &StimulusInterval,
    sampling_rate: f64,
    total_samples: usize,
) -> Result<SampleRange, RangeRejection> {
    let (start_index, end_index) = match (
        to_index(interval.start, sampling_rate),
        to_index(interval.end, sampling_rate),
    ) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(RangeRejection::NonFinite {
                start: interval.start,
                end: interval.end,
            })
        }
    };

    if start_index < 0 {
        return Err(RangeRejection::NegativeStart { start_index });
    }
    if end_index > total_samples as i64 {
        return Err(RangeRejection::PastEnd {
            end_index,
            total_samples,
        });
    }
    if start_index >= end_index {
        return Err(RangeRejection::Empty {
            start_index,
            end_index,
        });
    }

    Ok(SampleRange {
        start: start_index as usize,
        end: end_index as usize,
    })
}
