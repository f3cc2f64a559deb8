//! Descriptive statistics over feature columns.

use crate::report::table::FeatureTable;
use serde::Serialize;
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Distribution of one feature column. NaN values are not counted.
///
/// Quartiles come from statrs `OrderStatistics::quantile`, which uses the
/// median-unbiased (R-8) estimator rather than linear (R-7) interpolation, so
/// on small columns they can differ from spreadsheet or pandas output.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Summarize a set of values.
    pub fn from_values(column: &str, values: &[f64]) -> Self {
        let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if values.is_empty() {
            return Self {
                column: column.to_string(),
                count: 0,
                mean: f64::NAN,
                std_dev: f64::NAN,
                min: f64::NAN,
                q25: f64::NAN,
                median: f64::NAN,
                q75: f64::NAN,
                max: f64::NAN,
            };
        }

        let mean = Statistics::mean(&values);
        let std_dev = Statistics::std_dev(&values);
        let min = Statistics::min(&values);
        let max = Statistics::max(&values);
        let count = values.len();

        let mut data = Data::new(values);
        Self {
            column: column.to_string(),
            count,
            mean,
            std_dev,
            min,
            q25: data.quantile(0.25),
            median: data.quantile(0.5),
            q75: data.quantile(0.75),
            max,
        }
    }
}

/// Summarize the named columns of a table. Unknown names are skipped.
pub fn summarize(table: &FeatureTable, columns: &[String]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .filter_map(|name| {
            table
                .numeric_column(name)
                .map(|values| ColumnSummary::from_values(name, &values))
        })
        .collect()
}

/// Fixed-width text rendering, one column per line.
pub fn format_summary(summaries: &[ColumnSummary]) -> String {
    let width = summaries
        .iter()
        .map(|s| s.column.len())
        .max()
        .unwrap_or(0)
        .max("column".len());

    let mut out = format!(
        "{:<width$} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in summaries {
        out.push_str(&format!(
            "{:<width$} {:>6} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}\n",
            s.column, s.count, s.mean, s.std_dev, s.min, s.q25, s.median, s.q75, s.max
        ));
    }
    out
}
