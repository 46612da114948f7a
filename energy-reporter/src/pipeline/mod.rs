use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn received_now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

/// A message as delivered by the transport: a source path and its raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub source: String,
    pub payload: String,
}

impl RawMessage {
    pub fn new(source: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            payload: payload.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("malformed sample on '{topic}': {reason}")]
    MalformedSample { topic: String, reason: String },
    #[error("sink error: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

/// Consumes a stream until it ends. Errors carried by the stream are per-item
/// and must not stop the sink; only the sink's own fatal failures are returned.
#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

pub struct Pipeline<S, I, O, K> {
    pub source: S,
    pub transform: Arc<dyn Transform<I, O> + Send + Sync>,
    pub sink: K,
}

impl<S, I, O, K> Pipeline<S, I, O, K>
where
    I: Send + 'static,
    O: Send + 'static,
    S: Source<I> + Send + Sync + 'static,
    K: Sink<O> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<(), PipelineError> {
        let stream = self.source.stream().await;

        let transform = self.transform;
        let stream = Box::pin(stream.then(move |item| {
            let t = transform.clone();
            async move {
                match item {
                    Ok(env) => t.apply(env).await,
                    Err(e) => Err(e),
                }
            }
        }));

        self.sink.run(stream).await
    }
}
