use std::sync::Arc;

use telemetry_client::ReadingStore;
use time::OffsetDateTime;

use crate::{
    config::ReportsConfig,
    report::{ensure_readings, fetch_window, render, Period, Report, ReportError, Window},
};

pub mod spool;

pub use spool::SpoolMailer;

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("mail hand-off failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("mail rejected: {0}")]
    Rejected(String),
}

/// The finished report as handed to the mail collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub subject: String,
    pub html_body: String,
    pub attachment: Vec<u8>,
    pub attachment_name: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, artifact: &ReportArtifact) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent,
    /// The window held no readings; nothing was sent.
    Skipped,
}

/// Generates and dispatches reports. Cheap to share behind an `Arc`; every
/// run builds its own tables.
pub struct ReportService {
    store: Arc<dyn ReadingStore>,
    mailer: Arc<dyn Mailer>,
    settings: ReportsConfig,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReadingStore>, mailer: Arc<dyn Mailer>, settings: ReportsConfig) -> Self {
        Self { store, mailer, settings }
    }

    pub fn settings(&self) -> &ReportsConfig {
        &self.settings
    }

    pub async fn run_report(&self, period: Period) -> Result<ReportOutcome, ReportError> {
        self.run_report_at(period, OffsetDateTime::now_utc()).await
    }

    /// Run the report whose window ends on the calendar day of `now`.
    pub async fn run_report_at(&self, period: Period, now: OffsetDateTime) -> Result<ReportOutcome, ReportError> {
        let today = now.to_offset(self.settings.utc_offset).date();
        let window = Window::for_period(period, today, self.settings.utc_offset);

        tracing::info!(
            %period,
            first_day = %window.first_day,
            last_day = %window.last_day,
            "starting report generation"
        );

        let outcome = self.generate_and_send(period, &window).await;

        let label = match &outcome {
            Ok(ReportOutcome::Sent) => "sent",
            Ok(ReportOutcome::Skipped) => "skipped",
            Err(ReportError::Dispatch(_)) => "dispatch_failed",
            Err(_) => "failed",
        };
        metrics::counter!("report_runs_total", "period" => period.as_str(), "outcome" => label).increment(1);

        outcome
    }

    async fn generate_and_send(&self, period: Period, window: &Window) -> Result<ReportOutcome, ReportError> {
        let report = match self.generate(period, window).await {
            Ok(report) => report,
            Err(ReportError::EmptyWindow { .. }) => {
                tracing::info!(%period, "no data for the period, skipping report");
                return Ok(ReportOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let artifact = self.render(&report)?;
        self.mailer.send(&artifact).await?;

        tracing::info!(
            %period,
            subject = %artifact.subject,
            attachment = %artifact.attachment_name,
            "report dispatched"
        );
        Ok(ReportOutcome::Sent)
    }

    /// Fetch and assemble a report without dispatching it.
    pub async fn generate(&self, period: Period, window: &Window) -> Result<Report, ReportError> {
        let raw = self.store.query_all(window.start(), window.end()).await?;
        ensure_readings(window, &raw)?;
        tracing::debug!(%period, readings = raw.len(), "found readings for window");

        let settings = &self.settings;
        let data = fetch_window(
            self.store.as_ref(),
            &settings.energy_metrics,
            |m| settings.source_for_metric(m),
            window,
        )
        .await?;

        Report::assemble(period, &raw, &data, &settings.energy_metrics, &settings.summary_metrics)
    }

    pub fn render(&self, report: &Report) -> Result<ReportArtifact, ReportError> {
        let title = &self.settings.title;
        Ok(ReportArtifact {
            subject: render::subject(report, title),
            html_body: render::html_body(report, title),
            attachment: render::to_csv(&report.table)?,
            attachment_name: render::attachment_name(report, title),
        })
    }
}
