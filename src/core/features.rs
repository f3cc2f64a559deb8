//! Per-channel feature computation.
//!
//! Two features are computed for every channel of every interval:
//!
//! - **line length** on the segment z-normalized with its own statistics
//! - **mean** on the raw segment, in the recording's original units
//!
//! The two are deliberately computed from different arrays.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Features for one channel over one interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFeatures {
    /// Channel label
    pub channel: String,
    /// Sum of absolute first differences of the normalized segment
    pub line_length: f64,
    /// Mean of the raw segment
    pub mean: f64,
}

/// Standardize a segment with its own mean and population standard deviation.
///
/// The deviation is taken from the residuals against the mean, so any
/// constant segment has exactly zero deviation and normalizes to NaN.
pub fn z_normalize(segment: &[f64]) -> Vec<f64> {
    let mean = Statistics::mean(segment);
    let std_dev = population_std_dev(segment, mean);
    segment.iter().map(|&v| (v - mean) / std_dev).collect()
}

fn population_std_dev(segment: &[f64], mean: f64) -> f64 {
    let sum_sq: f64 = segment.iter().map(|&v| (v - mean).powi(2)).sum();
    (sum_sq / segment.len() as f64).sqrt()
}

/// Sum of absolute differences between consecutive samples.
pub fn absolute_difference_sum(values: &[f64]) -> f64 {
    values
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .sum()
}

/// Line length of the z-normalized segment.
pub fn line_length(segment: &[f64]) -> f64 {
    absolute_difference_sum(&z_normalize(segment))
}

/// Arithmetic mean of the raw segment.
pub fn mean(segment: &[f64]) -> f64 {
    Statistics::mean(segment)
}

/// Compute both features for one channel segment.
pub fn channel_features(channel: &str, segment: &[f64]) -> ChannelFeatures {
    ChannelFeatures {
        channel: channel.to_string(),
        line_length: line_length(segment),
        mean: mean(segment),
    }
}
