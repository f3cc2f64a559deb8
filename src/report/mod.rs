//! Report aggregation.
//!
//! Feature records from all sessions are laid out as a column-ordered
//! [`FeatureTable`] and handed to a [`TableSink`].

pub mod sink;
pub mod summary;
pub mod table;

pub use sink::{render_csv, render_json, render_jsonl, FileSink, OutputFormat, ReportError, TableSink};
pub use summary::{format_summary, summarize, ColumnSummary};
pub use table::{Cell, FeatureTable, LINE_LENGTH_SUFFIX, MEAN_SUFFIX, META_COLUMNS};
