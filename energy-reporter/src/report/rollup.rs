use telemetry_client::{Reading, Sample};

/// Usage of a cumulative counter over an ascending series: `last - first`.
///
/// An empty series contributes `0.0`. Decreasing counters produce a negative
/// delta which is returned unchanged.
pub fn delta(series: &[Sample]) -> f64 {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => last.value - first.value,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub max: f64,
    pub min: f64,
    pub avg: f64,
    pub count: usize,
}

/// Max/min/mean of raw values; `None` when there are no values.
pub fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let (max, min, sum) = values
        .iter()
        .fold((f64::NEG_INFINITY, f64::INFINITY, 0.0), |(max, min, sum), &v| {
            (max.max(v), min.min(v), sum + v)
        });

    Some(Summary {
        max,
        min,
        // rounding in the sum can push the mean just past the extremes
        avg: (sum / values.len() as f64).clamp(min, max),
        count: values.len(),
    })
}

/// Short metric name of a source path: its second-to-last segment.
///
/// `solar_assistant/total/battery_power/state` -> `battery_power`.
pub fn short_name(source: &str) -> Option<&str> {
    let mut segments = source.rsplit('/');
    segments.next()?;
    segments.next().filter(|s| !s.is_empty())
}

/// Summaries of the enabled instantaneous metrics over a window's raw
/// readings, in the order of `enabled`. Metrics without samples are omitted.
pub fn summarize_readings(readings: &[Reading], enabled: &[String]) -> Vec<(String, Summary)> {
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); enabled.len()];

    for r in readings {
        let Some(name) = short_name(&r.source) else {
            continue;
        };
        if let Some(idx) = enabled.iter().position(|m| m == name) {
            values[idx].push(r.value);
        }
    }

    enabled
        .iter()
        .zip(values)
        .filter_map(|(metric, vals)| summarize(&vals).map(|s| (metric.clone(), s)))
        .collect()
}
