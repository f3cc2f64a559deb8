//! Column-ordered feature table.
//!
//! Column layout:
//!
//! ```text
//! session | label | start_time | end_time | duration | <ch>_Line_Length... | <ch>_Mean...
//! ```
//!
//! Channels appear in the order they are first seen across the records.

use crate::core::session::FeatureRecord;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Metadata columns, always first and in this order.
pub const META_COLUMNS: [&str; 5] = ["session", "label", "start_time", "end_time", "duration"];

/// Suffix of line-length feature columns.
pub const LINE_LENGTH_SUFFIX: &str = "_Line_Length";

/// Suffix of mean feature columns.
pub const MEAN_SUFFIX: &str = "_Mean";

/// A single table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// No value (absent label, or a channel the session does not have)
    Empty,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Empty => Ok(()),
        }
    }
}

// Non-finite numbers become strings so they stay visible in JSON output.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(v) if v.is_finite() => serializer.serialize_f64(*v),
            Cell::Number(v) => serializer.serialize_str(&v.to_string()),
            Cell::Empty => serializer.serialize_none(),
        }
    }
}

/// Feature records laid out as rows of named columns.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    channels: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl FeatureTable {
    /// Lay out records in order.
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        let mut channels: Vec<String> = Vec::new();
        for record in records {
            for features in &record.channels {
                if !channels.contains(&features.channel) {
                    channels.push(features.channel.clone());
                }
            }
        }

        let columns = META_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(channels.iter().map(|c| format!("{c}{LINE_LENGTH_SUFFIX}")))
            .chain(channels.iter().map(|c| format!("{c}{MEAN_SUFFIX}")))
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![
                    Cell::Text(record.session.clone()),
                    record
                        .label
                        .as_ref()
                        .map(|l| Cell::Text(l.clone()))
                        .unwrap_or(Cell::Empty),
                    Cell::Number(record.start_time),
                    Cell::Number(record.end_time),
                    Cell::Number(record.duration),
                ];
                row.extend(channels.iter().map(|c| {
                    record
                        .channel(c)
                        .map(|f| Cell::Number(f.line_length))
                        .unwrap_or(Cell::Empty)
                }));
                row.extend(channels.iter().map(|c| {
                    record
                        .channel(c)
                        .map(|f| Cell::Number(f.mean))
                        .unwrap_or(Cell::Empty)
                }));
                row
            })
            .collect();

        Self {
            channels,
            columns,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Channel labels in column order.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of distinct sessions in the table.
    pub fn session_count(&self) -> usize {
        let mut sessions: Vec<&Cell> = self.rows.iter().map(|r| &r[0]).collect();
        sessions.dedup();
        sessions.len()
    }

    pub fn line_length_columns(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| format!("{c}{LINE_LENGTH_SUFFIX}"))
            .collect()
    }

    pub fn mean_columns(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| format!("{c}{MEAN_SUFFIX}"))
            .collect()
    }

    /// Numeric values of a column, skipping empty cells.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row[index].as_number())
                .collect(),
        )
    }

    /// Borrow a row as a serializable column-name-to-value map.
    pub fn row_view(&self, index: usize) -> Option<RowView<'_>> {
        self.rows.get(index).map(|cells| RowView {
            columns: &self.columns,
            cells,
        })
    }

    /// All rows as serializable maps.
    pub fn row_views(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|cells| RowView {
            columns: &self.columns,
            cells,
        })
    }
}

/// One row serialized as an ordered map.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}
