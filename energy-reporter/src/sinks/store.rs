use std::sync::Arc;

use futures::StreamExt;
use telemetry_client::{Reading, ReadingStore};

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Appends each normalized reading to a `ReadingStore`.
///
/// Per-item failures never stop ingestion: malformed samples and failed
/// appends are logged, counted and dropped. Nothing is retried; the next
/// message is simply attempted again.
pub struct StoreSink {
    store: Arc<dyn ReadingStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Sink<Reading> for StoreSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send + Unpin + 'static,
    {
        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e @ PipelineError::MalformedSample { .. }) => {
                    tracing::warn!(error = %e, "skipping malformed sample");
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "error in upstream pipeline for StoreSink");
                    continue;
                }
            };

            let reading = &env.payload;
            match self.store.append(reading).await {
                Ok(()) => {
                    tracing::debug!(source = %reading.source, value = reading.value, "saved reading");
                }
                Err(e) => {
                    tracing::error!(error = %e, source = %reading.source, "failed to persist reading, dropping it");
                    metrics::counter!("store_append_errors_total").increment(1);
                }
            }
        }

        tracing::info!("ingest stream ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_client::db::MemoryReadingStore;
    use time::macros::datetime;

    fn envelope(value: f64) -> Result<Envelope<Reading>, PipelineError> {
        Ok(Envelope::received_now(Reading::new(
            "solar_assistant/total/load_energy/state",
            value,
            datetime!(2024-01-01 08:00 UTC),
        )))
    }

    #[tokio::test]
    async fn store_failures_do_not_stop_the_sink() {
        let store = Arc::new(MemoryReadingStore::new());
        store.set_unavailable(true);
        let sink = StoreSink::new(store.clone());

        let input = futures::stream::iter(vec![envelope(1.0), envelope(2.0)]);
        sink.run(input).await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn upstream_errors_are_skipped() {
        let store = Arc::new(MemoryReadingStore::new());
        let sink = StoreSink::new(store.clone());

        let input = futures::stream::iter(vec![
            envelope(1.0),
            Err(PipelineError::MalformedSample {
                topic: "x".to_string(),
                reason: "bad".to_string(),
            }),
            envelope(2.0),
        ]);
        sink.run(input).await.unwrap();

        assert_eq!(store.len(), 2);
    }
}
