pub mod calendar;
pub mod labels;
pub mod render;
pub mod rollup;
pub mod table;
pub mod window;

use telemetry_client::{Reading, StoreError};

use crate::dispatch::DispatchError;

pub use calendar::{Period, Window};
pub use table::{ReportRow, ReportTable, RowLabel, SummaryTable};
pub use window::{fetch_window, WindowData};

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("no readings between {first_day} and {last_day}")]
    EmptyWindow {
        first_day: time::Date,
        last_day: time::Date,
    },
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("render error: {0}")]
    Render(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Fail with `EmptyWindow` when a window has no readings of any kind.
pub fn ensure_readings(window: &Window, readings: &[Reading]) -> Result<(), ReportError> {
    if readings.is_empty() {
        return Err(ReportError::EmptyWindow {
            first_day: window.first_day,
            last_day: window.last_day,
        });
    }
    Ok(())
}

/// Everything one run renders; owned by that run only.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub period: Period,
    pub window: Window,
    pub table: ReportTable,
    pub summary: SummaryTable,
}

impl Report {
    /// Build the energy table from `data` and the summary from the raw
    /// readings of the same window.
    pub fn assemble(
        period: Period,
        raw: &[Reading],
        data: &WindowData,
        energy_metrics: &[String],
        summary_metrics: &[String],
    ) -> Result<Self, ReportError> {
        let window = *data.window();
        ensure_readings(&window, raw)?;

        Ok(Self {
            period,
            window,
            table: ReportTable::build(data, energy_metrics),
            summary: SummaryTable::from_readings(raw, summary_metrics),
        })
    }
}
