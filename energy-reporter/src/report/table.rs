use std::fmt;

use telemetry_client::Reading;
use time::Date;

use super::{
    labels::metric_label,
    rollup::{delta, summarize_readings, Summary},
    window::WindowData,
};

pub const TOTAL_LABEL: &str = "Total";

/// Round for presentation. Internal sums always use full precision.
pub fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    // avoid rendering "-0.00"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub metric: String,
    pub label: String,
}

impl Column {
    pub fn for_metric(metric: &str) -> Self {
        Self {
            metric: metric.to_string(),
            label: metric_label(metric),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLabel {
    Date(Date),
    Total,
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLabel::Date(d) => write!(f, "{d}"),
            RowLabel::Total => f.write_str(TOTAL_LABEL),
        }
    }
}

/// One row: a label plus one full-precision value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub label: RowLabel,
    pub values: Vec<f64>,
}

impl ReportRow {
    pub fn is_total(&self) -> bool {
        self.label == RowLabel::Total
    }

    pub fn rounded(&self) -> Vec<f64> {
        self.values.iter().copied().map(round2).collect()
    }
}

/// Per-day energy usage with an optional trailing total row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub columns: Vec<Column>,
    pub rows: Vec<ReportRow>,
    pub total: Option<ReportRow>,
}

impl ReportTable {
    /// One row per day of the window; multi-day windows get a total row.
    pub fn build(data: &WindowData, metrics: &[String]) -> Self {
        let columns: Vec<Column> = metrics.iter().map(|m| Column::for_metric(m)).collect();
        let window = data.window();

        let rows: Vec<ReportRow> = window
            .days()
            .map(|day| ReportRow {
                label: RowLabel::Date(day),
                values: metrics.iter().map(|m| delta(data.day(m, day))).collect(),
            })
            .collect();

        let total = (!window.is_single_day()).then(|| ReportRow {
            label: RowLabel::Total,
            values: (0..columns.len())
                .map(|col| rows.iter().map(|r| r.values[col]).sum())
                .collect(),
        });

        Self { columns, rows, total }
    }

    /// Day rows followed by the total row, if any.
    pub fn all_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().chain(self.total.as_ref())
    }

    pub fn column_index(&self, metric: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.metric == metric)
    }

    pub fn headers(&self) -> Vec<&str> {
        std::iter::once("Date")
            .chain(self.columns.iter().map(|c| c.label.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub metric: String,
    pub label: String,
    pub summary: Summary,
}

/// Max/min/avg of instantaneous metrics over the whole window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn from_readings(readings: &[Reading], enabled: &[String]) -> Self {
        let rows = summarize_readings(readings, enabled)
            .into_iter()
            .map(|(metric, summary)| SummaryRow {
                label: metric_label(&metric),
                metric,
                summary,
            })
            .collect();

        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
