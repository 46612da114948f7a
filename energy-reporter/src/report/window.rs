use std::collections::HashMap;

use telemetry_client::{ReadingStore, Sample, StoreError};
use time::Date;

use super::calendar::{day_end, day_start, Window};

/// All samples of a report's cumulative metrics over a whole window, keyed by
/// metric name and ascending by timestamp.
#[derive(Debug, Clone)]
pub struct WindowData {
    window: Window,
    series: HashMap<String, Vec<Sample>>,
}

impl WindowData {
    pub fn new(window: Window, series: HashMap<String, Vec<Sample>>) -> Self {
        Self { window, series }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The whole-window series of a metric; empty if the metric is unknown.
    pub fn series(&self, metric: &str) -> &[Sample] {
        self.series.get(metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The part of a metric's series that falls on `date`.
    ///
    /// Pure in-memory slicing over the already-fetched, ascending series.
    pub fn day(&self, metric: &str, date: Date) -> &[Sample] {
        let series = self.series(metric);
        let start = day_start(date, self.window.offset);
        let end = day_end(date, self.window.offset);

        let lo = series.partition_point(|s| s.ts < start);
        let hi = series.partition_point(|s| s.ts <= end);
        &series[lo..hi.max(lo)]
    }

    pub fn total_samples(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}

/// Load every metric's samples for the whole window in one store round trip.
///
/// `source_for` maps a metric name to the source it is stored under.
pub async fn fetch_window<F>(
    store: &dyn ReadingStore,
    metrics: &[String],
    source_for: F,
    window: &Window,
) -> Result<WindowData, StoreError>
where
    F: Fn(&str) -> String,
{
    let sources: Vec<(String, String)> = metrics.iter().map(|m| (m.clone(), source_for(m))).collect();
    let source_names: Vec<String> = sources.iter().map(|(_, s)| s.clone()).collect();

    let by_source = store.query_multi(&source_names, window.start(), window.end()).await?;

    // two metrics may map to one source, so look up instead of taking
    let series = sources
        .into_iter()
        .map(|(metric, source)| {
            let samples = by_source.get(&source).cloned().unwrap_or_default();
            (metric, samples)
        })
        .collect();

    let data = WindowData::new(*window, series);
    tracing::debug!(
        first_day = %window.first_day,
        last_day = %window.last_day,
        metrics = metrics.len(),
        samples = data.total_samples(),
        "fetched report window"
    );

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::calendar::Period;
    use telemetry_client::{db::MemoryReadingStore, Reading};
    use time::{
        macros::{date, datetime},
        UtcOffset,
    };

    fn source_for(metric: &str) -> String {
        format!("solar_assistant/total/{metric}/state")
    }

    async fn seeded_store() -> MemoryReadingStore {
        let store = MemoryReadingStore::new();
        let rows = [
            ("pv_energy", 10.0, datetime!(2024-01-01 00:00 UTC)),
            ("pv_energy", 12.0, datetime!(2024-01-01 23:59:59.999999 UTC)),
            ("pv_energy", 12.5, datetime!(2024-01-02 00:00 UTC)),
            ("pv_energy", 15.0, datetime!(2024-01-02 18:00 UTC)),
            ("load_energy", 1.0, datetime!(2024-01-02 06:00 UTC)),
        ];
        for (metric, value, ts) in rows {
            store.append(&Reading::new(source_for(metric), value, ts)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn day_slices_follow_inclusive_day_bounds() {
        let store = seeded_store().await;
        let window = Window::for_period(Period::Weekly, date!(2024 - 01 - 03), UtcOffset::UTC);
        let metrics = vec!["pv_energy".to_string(), "load_energy".to_string()];

        let data = fetch_window(&store, &metrics, source_for, &window).await.unwrap();

        let day1: Vec<f64> = data.day("pv_energy", date!(2024 - 01 - 01)).iter().map(|s| s.value).collect();
        let day2: Vec<f64> = data.day("pv_energy", date!(2024 - 01 - 02)).iter().map(|s| s.value).collect();
        assert_eq!(day1, vec![10.0, 12.0]);
        assert_eq!(day2, vec![12.5, 15.0]);
        assert!(data.day("load_energy", date!(2024 - 01 - 01)).is_empty());
        assert!(data.day("grid_energy_out", date!(2024 - 01 - 01)).is_empty());
    }

    #[tokio::test]
    async fn repeated_metric_keeps_its_samples() {
        let store = seeded_store().await;
        let window = Window::for_period(Period::Daily, date!(2024 - 01 - 02), UtcOffset::UTC);
        let metrics = vec!["pv_energy".to_string(), "pv_energy".to_string()];

        let data = fetch_window(&store, &metrics, source_for, &window).await.unwrap();

        assert_eq!(data.series("pv_energy").len(), 2);
    }

    #[tokio::test]
    async fn one_round_trip_regardless_of_window_length() {
        let metrics = vec!["pv_energy".to_string(), "load_energy".to_string()];

        for period in [Period::Daily, Period::Monthly] {
            let store = seeded_store().await;
            let window = Window::for_period(period, date!(2024 - 01 - 31), UtcOffset::UTC);

            let data = fetch_window(&store, &metrics, source_for, &window).await.unwrap();
            for day in window.days() {
                let _ = data.day("pv_energy", day);
                let _ = data.day("load_energy", day);
            }

            assert_eq!(store.round_trips(), 1, "{period} window");
        }
    }
}
