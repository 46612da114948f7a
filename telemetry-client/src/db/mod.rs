use std::collections::HashMap;

use time::OffsetDateTime;

use crate::domain::{Reading, Sample};

pub mod memory;
pub mod questdb;

pub use memory::MemoryReadingStore;
pub use questdb::QuestDbReadingStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Append-only, range-queryable persistence for `Reading`s.
///
/// All ranges are closed: `start <= ts <= end`. Results are ascending by
/// `ts`. An empty result is a normal outcome, never an error.
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    async fn append(&self, reading: &Reading) -> Result<(), StoreError>;

    /// All samples of one source within `[start, end]`.
    async fn query_range(
        &self,
        source: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Sample>, StoreError>;

    /// Samples of many sources within `[start, end]` in a single round trip.
    ///
    /// Every requested source is a key of the returned map; sources without
    /// samples map to an empty vec.
    async fn query_multi(
        &self,
        sources: &[String],
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<HashMap<String, Vec<Sample>>, StoreError>;

    /// Every reading of every source within `[start, end]`.
    async fn query_all(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, StoreError>;
}

/// Group readings (already ascending by `ts`) into per-source series, seeding
/// every requested source with an empty series.
pub(crate) fn group_by_source(
    sources: &[String],
    readings: impl IntoIterator<Item = Reading>,
) -> HashMap<String, Vec<Sample>> {
    let mut out: HashMap<String, Vec<Sample>> = sources
        .iter()
        .map(|s| (s.clone(), Vec::new()))
        .collect();

    for r in readings {
        if let Some(series) = out.get_mut(&r.source) {
            series.push(r.sample());
        }
    }

    out
}
