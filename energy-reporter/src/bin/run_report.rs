//! Generate and spool a single report immediately.
//!
//! Usage: run_report <daily|weekly|monthly>
//!
//! Uses the same `REPORTER_CONFIG` file as the service.

use anyhow::{Context, Result};
use energy_reporter::{
    config::AppConfig,
    dispatch::{ReportOutcome, ReportService, SpoolMailer},
    observability, Period,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use telemetry_client::db::QuestDbReadingStore;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let arg = std::env::args()
        .nth(1)
        .context("usage: run_report <daily|weekly|monthly>")?;
    let period: Period = arg.parse().map_err(|e| anyhow::anyhow!("{e}"))?;

    let cfg = AppConfig::load()?;
    let pool = PgPoolOptions::new()
        .max_connections(cfg.store.max_connections)
        .connect(&cfg.store.uri)
        .await?;

    let service = ReportService::new(
        Arc::new(QuestDbReadingStore::new(pool)),
        Arc::new(SpoolMailer::from_config(&cfg.mail)),
        cfg.reports.clone(),
    );

    match service.run_report(period).await? {
        ReportOutcome::Sent => println!("{period} report written to {}", cfg.mail.outbox_dir.display()),
        ReportOutcome::Skipped => println!("no data for the {period} report, nothing sent"),
    }

    Ok(())
}
