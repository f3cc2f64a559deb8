//! Event log parsing.
//!
//! A stimulus log is a text file with one event per line:
//!
//! ```text
//! <timestamp> <ignored> <marker> [label words...]
//! ```
//!
//! Marker `5` opens a stimulus interval and marker `6` closes it. Every other
//! marker is ignored. Malformed lines never abort parsing; they are reported
//! as [`ParseWarning`]s next to the intervals that were recovered.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// Marker code that opens a stimulus interval.
pub const MARKER_START: i64 = 5;

/// Marker code that closes a stimulus interval.
pub const MARKER_END: i64 = 6;

/// Minimum number of whitespace-separated tokens in a data line.
const MIN_TOKENS: usize = 3;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// A single parsed log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Seconds since the start of the recording
    pub time: f64,
    /// Event type
    pub marker: i64,
    /// Free-text label (tokens after the marker, single-space joined)
    pub label: Option<String>,
}

/// A labeled time interval between a start and an end marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusInterval {
    pub label: Option<String>,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (not guaranteed to be after `start`)
    pub end: f64,
}

impl StimulusInterval {
    /// Interval length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Recoverable problems found while parsing a log.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// Timestamp or marker token did not parse.
    MalformedLine {
        line_number: usize,
        line: String,
        reason: String,
    },
    /// A start marker arrived while another interval was still open.
    UnclosedInterval {
        label: Option<String>,
        start: f64,
        superseded_at: f64,
    },
    /// The log ended while an interval was still open.
    AbandonedAtEnd { label: Option<String>, start: f64 },
    /// The log could not be read at all.
    Unreadable { path: String, error: String },
    /// The log is not valid UTF-8; bad bytes were replaced before parsing.
    InvalidEncoding { path: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::MalformedLine {
                line_number,
                line,
                reason,
            } => write!(f, "line {line_number}: could not parse '{line}': {reason}"),
            ParseWarning::UnclosedInterval {
                label,
                start,
                superseded_at,
            } => write!(
                f,
                "unclosed interval '{}' starting at {start}s superseded by a new start at {superseded_at}s",
                display_label(label)
            ),
            ParseWarning::AbandonedAtEnd { label, start } => write!(
                f,
                "interval '{}' starting at {start}s was never closed before the end of the log",
                display_label(label)
            ),
            ParseWarning::Unreadable { path, error } => {
                write!(f, "could not read log file {path}: {error}")
            }
            ParseWarning::InvalidEncoding { path } => {
                write!(f, "log file {path} is not valid UTF-8, undecodable bytes replaced")
            }
        }
    }
}

fn display_label(label: &Option<String>) -> &str {
    label.as_deref().unwrap_or("<none>")
}

/// Intervals recovered from a log plus everything that went wrong on the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub intervals: Vec<StimulusInterval>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedLog {
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Why a data line was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum LineError {
    InvalidTimestamp(String),
    InvalidMarker(String),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::InvalidTimestamp(token) => write!(f, "invalid timestamp '{token}'"),
            LineError::InvalidMarker(token) => write!(f, "invalid marker code '{token}'"),
        }
    }
}

impl std::error::Error for LineError {}

/// Parse one already-cleaned line.
///
/// Returns `Ok(None)` for lines that carry no event (fewer than three tokens).
pub fn parse_event_line(line: &str) -> Result<Option<LogEvent>, LineError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_TOKENS {
        return Ok(None);
    }

    let time: f64 = tokens[0]
        .parse()
        .map_err(|_| LineError::InvalidTimestamp(tokens[0].to_string()))?;
    let marker: i64 = tokens[2]
        .parse()
        .map_err(|_| LineError::InvalidMarker(tokens[2].to_string()))?;

    let label = if tokens.len() > MIN_TOKENS {
        Some(tokens[MIN_TOKENS..].join(" "))
    } else {
        None
    };

    Ok(Some(LogEvent {
        time,
        marker,
        label,
    }))
}

/// Interval pairing state.
#[derive(Debug, Clone, PartialEq)]
enum PairingState {
    Idle,
    Open { start: f64, label: Option<String> },
}

/// Pairs start/end markers into intervals, one event at a time.
#[derive(Debug)]
pub struct IntervalPairer {
    state: PairingState,
    intervals: Vec<StimulusInterval>,
    warnings: Vec<ParseWarning>,
}

impl IntervalPairer {
    pub fn new() -> Self {
        Self {
            state: PairingState::Idle,
            intervals: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether an interval is currently open.
    pub fn is_open(&self) -> bool {
        matches!(self.state, PairingState::Open { .. })
    }

    /// Feed one event through the state machine.
    pub fn push(&mut self, event: LogEvent) {
        match event.marker {
            MARKER_START => {
                let previous = std::mem::replace(
                    &mut self.state,
                    PairingState::Open {
                        start: event.time,
                        label: event.label,
                    },
                );
                if let PairingState::Open { start, label } = previous {
                    let warning = ParseWarning::UnclosedInterval {
                        label,
                        start,
                        superseded_at: event.time,
                    };
                    tracing::warn!("{warning}");
                    self.warnings.push(warning);
                }
            }
            MARKER_END => {
                if let PairingState::Open { start, label } =
                    std::mem::replace(&mut self.state, PairingState::Idle)
                {
                    self.intervals.push(StimulusInterval {
                        label,
                        start,
                        end: event.time,
                    });
                }
            }
            _ => {}
        }
    }

    /// Record a warning that happened outside the state machine.
    pub fn warn(&mut self, warning: ParseWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Close out parsing. An interval still open is dropped with a warning.
    pub fn finish(mut self) -> ParsedLog {
        if let PairingState::Open { start, label } =
            std::mem::replace(&mut self.state, PairingState::Idle)
        {
            self.warn(ParseWarning::AbandonedAtEnd { label, start });
        }

        ParsedLog {
            intervals: self.intervals,
            warnings: self.warnings,
        }
    }
}

impl Default for IntervalPairer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split on `\n`, `\r\n` and lone `\r` line endings.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// Parse a complete log held in memory.
pub fn parse_log(text: &str) -> ParsedLog {
    parse_lines(text, IntervalPairer::new())
}

fn parse_lines(text: &str, mut pairer: IntervalPairer) -> ParsedLog {
    for (index, raw) in split_lines(text).enumerate() {
        let cleaned = raw.replace(BYTE_ORDER_MARK, "");
        let line = cleaned.trim();
        if line.is_empty() {
            continue;
        }

        match parse_event_line(line) {
            Ok(Some(event)) => pairer.push(event),
            Ok(None) => {}
            Err(e) => pairer.warn(ParseWarning::MalformedLine {
                line_number: index + 1,
                line: line.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pairer.finish()
}

/// Parse a log file from disk.
///
/// An unreadable file is not an error: the result is empty and carries a
/// single [`ParseWarning::Unreadable`]. Invalid UTF-8 is decoded lossily so
/// the remaining lines still parse.
pub fn parse_log_file(path: &Path) -> ParsedLog {
    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(text) => parse_log(text),
            Cow::Owned(text) => {
                let mut pairer = IntervalPairer::new();
                pairer.warn(ParseWarning::InvalidEncoding {
                    path: path.display().to_string(),
                });
                parse_lines(&text, pairer)
            }
        },
        Err(e) => {
            let warning = ParseWarning::Unreadable {
                path: path.display().to_string(),
                error: e.to_string(),
            };
            tracing::warn!("{warning}");
            ParsedLog {
                intervals: Vec::new(),
                warnings: vec![warning],
            }
        }
    }
}
