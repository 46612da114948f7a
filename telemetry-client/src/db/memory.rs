use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        RwLock,
    },
};

use time::OffsetDateTime;

use super::{group_by_source, ReadingStore, StoreError};
use crate::domain::{Reading, Sample};

/// In-process `ReadingStore`.
///
/// Each source keeps its readings sorted by `ts`; equal timestamps keep
/// insertion order. The lock is held only for the duration of one operation.
/// Every query counts as one round trip, see [`MemoryReadingStore::round_trips`].
#[derive(Default)]
pub struct MemoryReadingStore {
    series: RwLock<HashMap<String, Vec<Reading>>>,
    round_trips: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queries served so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.series
            .read()
            .map(|s| s.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn begin_query(&self) -> Result<(), StoreError> {
        self.check_available()?;
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

fn in_range(r: &Reading, start: OffsetDateTime, end: OffsetDateTime) -> bool {
    r.ts >= start && r.ts <= end
}

#[async_trait::async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        self.check_available()?;

        let mut guard = self.series.write().map_err(poisoned)?;
        let series = guard.entry(reading.source.clone()).or_default();
        let idx = series.partition_point(|r| r.ts <= reading.ts);
        series.insert(idx, reading.clone());

        Ok(())
    }

    async fn query_range(
        &self,
        source: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Sample>, StoreError> {
        self.begin_query()?;

        let guard = self.series.read().map_err(poisoned)?;
        let out = guard
            .get(source)
            .map(|series| {
                series
                    .iter()
                    .filter(|r| in_range(r, start, end))
                    .map(Reading::sample)
                    .collect()
            })
            .unwrap_or_default();

        Ok(out)
    }

    async fn query_multi(
        &self,
        sources: &[String],
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<HashMap<String, Vec<Sample>>, StoreError> {
        self.begin_query()?;

        let guard = self.series.read().map_err(poisoned)?;
        let matching = sources
            .iter()
            .filter_map(|s| guard.get(s))
            .flat_map(|series| series.iter().filter(|r| in_range(r, start, end)).cloned());

        Ok(group_by_source(sources, matching))
    }

    async fn query_all(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, StoreError> {
        self.begin_query()?;

        let guard = self.series.read().map_err(poisoned)?;
        let mut out: Vec<Reading> = guard
            .values()
            .flat_map(|series| series.iter().filter(|r| in_range(r, start, end)).cloned())
            .collect();
        drop(guard);

        out.sort_by(|a, b| a.ts.cmp(&b.ts));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn reading(source: &str, value: f64, ts: OffsetDateTime) -> Reading {
        Reading::new(source, value, ts)
    }

    #[tokio::test]
    async fn query_range_returns_closed_interval_in_ascending_order() {
        let store = MemoryReadingStore::new();
        store.append(&reading("a/pv/state", 3.0, datetime!(2024-01-01 12:00 UTC))).await.unwrap();
        store.append(&reading("a/pv/state", 1.0, datetime!(2024-01-01 00:00 UTC))).await.unwrap();
        store.append(&reading("a/pv/state", 4.0, datetime!(2024-01-02 00:00 UTC))).await.unwrap();
        store.append(&reading("a/other/state", 9.0, datetime!(2024-01-01 06:00 UTC))).await.unwrap();

        let got = store
            .query_range(
                "a/pv/state",
                datetime!(2024-01-01 00:00 UTC),
                datetime!(2024-01-01 12:00 UTC),
            )
            .await
            .unwrap();

        let values: Vec<f64> = got.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[tokio::test]
    async fn duplicate_timestamps_are_kept_in_insertion_order() {
        let store = MemoryReadingStore::new();
        let ts = datetime!(2024-01-01 08:00 UTC);
        store.append(&reading("s", 1.0, ts)).await.unwrap();
        store.append(&reading("s", 2.0, ts)).await.unwrap();

        let got = store.query_range("s", ts, ts).await.unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].value, 1.0);
        assert_eq!(got[1].value, 2.0);
    }

    #[tokio::test]
    async fn query_multi_seeds_missing_sources_and_counts_one_round_trip() {
        let store = MemoryReadingStore::new();
        store.append(&reading("x", 1.0, datetime!(2024-01-01 01:00 UTC))).await.unwrap();

        let sources = vec!["x".to_string(), "y".to_string()];
        let got = store
            .query_multi(&sources, datetime!(2024-01-01 00:00 UTC), datetime!(2024-01-31 23:59 UTC))
            .await
            .unwrap();

        assert_eq!(got["x"].len(), 1);
        assert!(got["y"].is_empty());
        assert_eq!(store.round_trips(), 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_queries_and_appends() {
        let store = MemoryReadingStore::new();
        store.set_unavailable(true);

        let ts = datetime!(2024-01-01 00:00 UTC);
        assert!(matches!(
            store.append(&reading("s", 1.0, ts)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.query_all(ts, ts).await, Err(StoreError::Unavailable(_))));
        assert!(store.is_empty());
    }
}
