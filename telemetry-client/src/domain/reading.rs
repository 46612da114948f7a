use time::OffsetDateTime;

/// One persisted telemetry sample.
///
/// `ts` is the instant the engine received the sample, not the sender's clock.
/// Readings are append-only; two readings may share the same `(source, ts)`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    pub ts: OffsetDateTime,
    pub source: String,
    pub value: f64,
}

impl Reading {
    pub fn new(source: impl Into<String>, value: f64, ts: OffsetDateTime) -> Self {
        Self {
            ts,
            source: source.into(),
            value,
        }
    }

    pub fn sample(&self) -> Sample {
        Sample {
            value: self.value,
            ts: self.ts,
        }
    }
}

/// A `(value, timestamp)` pair as returned by range queries.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    pub value: f64,
    pub ts: OffsetDateTime,
}
