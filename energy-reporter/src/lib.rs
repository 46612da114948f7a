pub mod config;
pub mod dispatch;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use dispatch::{Mailer, ReportOutcome, ReportService};
pub use pipeline::{Envelope, Pipeline, RawMessage};
pub use report::{Period, ReportError};
