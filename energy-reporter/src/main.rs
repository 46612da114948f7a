use anyhow::Result;
use energy_reporter::{
    config::AppConfig,
    dispatch::{ReportService, SpoolMailer},
    metrics_server, observability,
    pipeline::{Pipeline, RawMessage},
    scheduler,
    sinks::StoreSink,
    sources::HttpIngestSource,
    transform::Normalizer,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use telemetry_client::{db::QuestDbReadingStore, ReadingStore};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.store.max_connections)
        .connect(&cfg.store.uri)
        .await?;
    let questdb = QuestDbReadingStore::new(pool);
    questdb.ensure_schema().await?;
    let store: Arc<dyn ReadingStore> = Arc::new(questdb);

    // Reports
    let mailer = Arc::new(SpoolMailer::from_config(&cfg.mail));
    let service = Arc::new(ReportService::new(store.clone(), mailer, cfg.reports.clone()));
    let schedules = scheduler::spawn_schedules(service);

    // Ingestion
    let source = HttpIngestSource::new(
        &cfg.ingest.http_bind_addr,
        cfg.ingest.channel_capacity,
        cfg.ingest.max_body_bytes,
    )
    .await?;
    let pipeline: Pipeline<_, RawMessage, _, _> = Pipeline {
        source,
        transform: Arc::new(Normalizer),
        sink: StoreSink::new(store),
    };

    scheduler::run_alongside(pipeline.run(), schedules).await;

    Ok(())
}
