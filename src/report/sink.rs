//! Table sinks.

use crate::report::table::FeatureTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Receives a finished feature table.
pub trait TableSink {
    fn write_table(&mut self, table: &FeatureTable) -> Result<(), ReportError>;
}

/// File formats the [`FileSink`] can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Jsonl,
}

impl OutputFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Report errors.
#[derive(Debug)]
pub enum ReportError {
    IoError(String),
    SerializeError(String),
    UnknownFormat(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::IoError(e) => write!(f, "IO error: {e}"),
            ReportError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ReportError::UnknownFormat(s) => {
                write!(f, "Unknown output format '{s}' (expected csv, json or jsonl)")
            }
        }
    }
}

impl std::error::Error for ReportError {}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render a table as CSV with a header row.
pub fn render_csv(table: &FeatureTable) -> String {
    let mut out = String::new();
    let header: Vec<String> = table.columns().iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in table.rows() {
        let fields: Vec<String> = row.iter().map(|cell| csv_field(&cell.to_string())).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Render a table as a pretty JSON array of row objects.
pub fn render_json(table: &FeatureTable) -> Result<String, ReportError> {
    let rows: Vec<_> = table.row_views().collect();
    serde_json::to_string_pretty(&rows).map_err(|e| ReportError::SerializeError(e.to_string()))
}

/// Render a table as JSON Lines, one row object per line.
pub fn render_jsonl(table: &FeatureTable) -> Result<String, ReportError> {
    let lines = table
        .row_views()
        .map(|row| serde_json::to_string(&row))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ReportError::SerializeError(e.to_string()))?;
    Ok(lines.join("\n"))
}

/// Writes the table to a file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSink for FileSink {
    fn write_table(&mut self, table: &FeatureTable) -> Result<(), ReportError> {
        let content = match self.format {
            OutputFormat::Csv => render_csv(table),
            OutputFormat::Json => render_json(table)?,
            OutputFormat::Jsonl => render_jsonl(table)?,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ReportError::IoError(e.to_string()))?;
        }
        std::fs::write(&self.path, content).map_err(|e| ReportError::IoError(e.to_string()))?;

        tracing::info!(
            path = %self.path.display(),
            rows = table.row_count(),
            format = %self.format,
            "feature table written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::ChannelFeatures;
    use crate::core::intervals::SampleRange;
    use crate::core::session::FeatureRecord;

    fn table() -> FeatureTable {
        FeatureTable::from_records(&[FeatureRecord {
            session: "s1".to_string(),
            label: Some("yes, no".to_string()),
            start_time: 2.0,
            end_time: 4.0,
            duration: 2.0,
            range: SampleRange { start: 200, end: 400 },
            channels: vec![ChannelFeatures {
                channel: "GSR".to_string(),
                line_length: f64::NAN,
                mean: 1.5,
            }],
        }])
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_csv() {
        let csv = render_csv(&table());
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("session,label,start_time,end_time,duration,GSR_Line_Length,GSR_Mean")
        );
        assert_eq!(lines.next(), Some("s1,\"yes, no\",2,4,2,NaN,1.5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_render_jsonl() {
        let jsonl = render_jsonl(&table()).unwrap();
        let row: serde_json::Value = serde_json::from_str(&jsonl).unwrap();
        assert_eq!(row["GSR_Line_Length"], "NaN");
        assert_eq!(row["GSR_Mean"], 1.5);
    }

    #[test]
    fn test_file_sink() {
        let path = std::env::temp_dir()
            .join(format!("polygraph-sink-{}", uuid::Uuid::new_v4()))
            .join("out.json");
        let mut sink = FileSink::new(&path, OutputFormat::Json);
        sink.write_table(&table()).unwrap();

        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["session"], "s1");

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
