use std::net::SocketAddr;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::post,
    Router,
};

use super::channel::{ChannelSource, IngestHandle};
use crate::pipeline::{EnvelopeStream, PipelineError, RawMessage, Source};

/// HTTP transport: `POST /ingest/<source path>` with the raw payload as body.
///
/// The path after `/ingest/` becomes the reading's source, e.g.
/// `POST /ingest/solar_assistant/total/pv_power/state` with body `1532`.
pub struct HttpIngestSource {
    inner: ChannelSource,
}

impl HttpIngestSource {
    pub async fn new(bind_addr: &str, channel_capacity: usize, max_body_bytes: usize) -> Result<Self, PipelineError> {
        let (handle, inner) = ChannelSource::new(channel_capacity);

        let addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| PipelineError::Source(format!("invalid bind addr: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| PipelineError::Source(format!("failed to bind ingest listener on {addr}: {e}")))?;

        let app = router(handle, max_body_bytes);

        tokio::spawn(async move {
            tracing::info!(%addr, "HTTP ingest listening");
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                tracing::error!(error = %e, "HTTP ingest server error");
            }
        });

        Ok(Self { inner })
    }
}

pub fn router(handle: IngestHandle, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/ingest/*source", post(ingest_sample))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(handle)
}

#[async_trait::async_trait]
impl Source<RawMessage> for HttpIngestSource {
    async fn stream(&self) -> EnvelopeStream<RawMessage> {
        self.inner.stream().await
    }
}

async fn ingest_sample(
    State(handle): State<IngestHandle>,
    Path(source): Path<String>,
    body: String,
) -> StatusCode {
    metrics::counter!("http_ingest_requests_total").increment(1);

    match handle.send(RawMessage::new(source, body)).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            tracing::error!(error = %e, "dropping HTTP sample");
            metrics::counter!("http_ingest_failed_total").increment(1);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use futures::StreamExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn post_queues_raw_payload_under_path_source() {
        let (handle, source) = ChannelSource::new(4);
        let app = router(handle, 1024);

        let req = Request::builder()
            .method("POST")
            .uri("/ingest/solar_assistant/total/pv_power/state")
            .body(Body::from("1532"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let mut stream = source.stream().await;
        let env = stream.next().await.unwrap().unwrap();
        assert_eq!(env.payload.source, "solar_assistant/total/pv_power/state");
        assert_eq!(env.payload.payload, "1532");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let (handle, _source) = ChannelSource::new(4);
        let app = router(handle, 8);

        let req = Request::builder()
            .method("POST")
            .uri("/ingest/a/b/state")
            .body(Body::from("123456789012345"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
