use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{DispatchError, Mailer, ReportArtifact};
use crate::config::MailConfig;

/// Writes each report into an outbox directory for an external relay to
/// pick up: `<stem>.html`, `<stem>.csv` and a `<stem>.json` envelope, where
/// `<stem>` is the attachment name without its extension. The envelope is
/// written last and marks the message as complete.
pub struct SpoolMailer {
    outbox_dir: PathBuf,
    from: String,
    to: String,
}

#[derive(Serialize)]
struct Envelope<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: String,
    attachment: String,
}

impl SpoolMailer {
    pub fn new(outbox_dir: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            outbox_dir: outbox_dir.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn from_config(cfg: &MailConfig) -> Self {
        Self::new(cfg.outbox_dir.clone(), cfg.from.clone(), cfg.to.clone())
    }

    pub fn outbox_dir(&self) -> &Path {
        &self.outbox_dir
    }

    fn stem(attachment_name: &str) -> &str {
        attachment_name
            .strip_suffix(".csv")
            .unwrap_or(attachment_name)
    }
}

#[async_trait::async_trait]
impl Mailer for SpoolMailer {
    async fn send(&self, artifact: &ReportArtifact) -> Result<(), DispatchError> {
        let stem = Self::stem(&artifact.attachment_name);
        if stem.is_empty() || stem.contains(['/', '\\']) {
            return Err(DispatchError::Rejected(format!(
                "invalid attachment name '{}'",
                artifact.attachment_name
            )));
        }

        tokio::fs::create_dir_all(&self.outbox_dir).await?;

        let html_name = format!("{stem}.html");
        let csv_name = format!("{stem}.csv");
        tokio::fs::write(self.outbox_dir.join(&html_name), &artifact.html_body).await?;
        tokio::fs::write(self.outbox_dir.join(&csv_name), &artifact.attachment).await?;

        let envelope = Envelope {
            from: &self.from,
            to: &self.to,
            subject: &artifact.subject,
            html_body: html_name,
            attachment: csv_name,
        };
        let json = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| DispatchError::Rejected(format!("failed to encode envelope: {e}")))?;
        tokio::fs::write(self.outbox_dir.join(format!("{stem}.json")), json).await?;

        tracing::debug!(outbox = %self.outbox_dir.display(), %stem, "report spooled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ReportArtifact {
        ReportArtifact {
            subject: "Solar Report - 2024-01-01 (Daily Report)".to_string(),
            html_body: "<html><body>hi</body></html>".to_string(),
            attachment: b"Date,Solar PV (kWh)\n2024-01-01,35.50\n".to_vec(),
            attachment_name: "solar_report_daily_2024-01-01.csv".to_string(),
        }
    }

    #[tokio::test]
    async fn spools_body_attachment_and_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = dir.path().join("outbox");
        let mailer = SpoolMailer::new(&outbox, "reports@example.com", "me@example.com");

        mailer.send(&artifact()).await.unwrap();

        let csv = std::fs::read_to_string(outbox.join("solar_report_daily_2024-01-01.csv")).unwrap();
        assert!(csv.ends_with("2024-01-01,35.50\n"));
        let html = std::fs::read_to_string(outbox.join("solar_report_daily_2024-01-01.html")).unwrap();
        assert!(html.contains("hi"));

        let raw = std::fs::read(outbox.join("solar_report_daily_2024-01-01.json")).unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(envelope["to"], "me@example.com");
        assert_eq!(envelope["subject"], "Solar Report - 2024-01-01 (Daily Report)");
        assert_eq!(envelope["attachment"], "solar_report_daily_2024-01-01.csv");
    }

    #[tokio::test]
    async fn rejects_attachment_names_with_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = SpoolMailer::new(dir.path(), "a@example.com", "b@example.com");
        let mut bad = artifact();
        bad.attachment_name = "../escape.csv".to_string();

        let res = mailer.send(&bad).await;
        assert!(matches!(res, Err(DispatchError::Rejected(_))));
    }

    #[tokio::test]
    async fn unwritable_outbox_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();
        let mailer = SpoolMailer::new(blocker.join("outbox"), "a@example.com", "b@example.com");

        let res = mailer.send(&artifact()).await;
        assert!(matches!(res, Err(DispatchError::Io(_))));
    }
}
