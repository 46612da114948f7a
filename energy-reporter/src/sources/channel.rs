use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, RawMessage, Source};

/// Sending half handed to a transport. Cloneable; sends wait for capacity
/// when the pipeline falls behind.
#[derive(Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<Envelope<RawMessage>>,
}

impl IngestHandle {
    /// Stamp the message with the current instant and queue it.
    pub async fn send(&self, message: RawMessage) -> Result<(), PipelineError> {
        self.tx
            .send(Envelope::received_now(message))
            .await
            .map_err(|_| PipelineError::Source("ingest channel closed".to_string()))
    }
}

/// Bounded queue between a transport and the normalizer.
#[derive(Clone)]
pub struct ChannelSource {
    receiver: Arc<Mutex<Option<mpsc::Receiver<Envelope<RawMessage>>>>>,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (IngestHandle, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let source = Self {
            receiver: Arc::new(Mutex::new(Some(rx))),
        };
        (IngestHandle { tx }, source)
    }
}

#[async_trait::async_trait]
impl Source<RawMessage> for ChannelSource {
    async fn stream(&self) -> EnvelopeStream<RawMessage> {
        let mut guard = self.receiver.lock().await;
        match guard.take() {
            Some(rx) => Box::pin(ReceiverStream::new(rx).map(Ok)),
            None => Box::pin(futures::stream::once(async {
                Err(PipelineError::Source(
                    "ChannelSource stream already taken; only one consumer supported".to_string(),
                ))
            })),
        }
    }
}
