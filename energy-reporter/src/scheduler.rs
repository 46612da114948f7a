//! Wall-clock triggers for the periodic reports.
//!
//! Daily reports fire every day, weekly reports on Mondays and monthly
//! reports on the first of the month, each at its configured local time.

use std::{future::Future, sync::Arc};

use time::{Date, OffsetDateTime, Time, UtcOffset, Weekday};
use tokio::task::JoinHandle;

use crate::{
    config::{ReportsConfig, ScheduleConfig},
    dispatch::{ReportOutcome, ReportService},
    pipeline::PipelineError,
    report::Period,
};

pub fn schedule_for(cfg: &ReportsConfig, period: Period) -> ScheduleConfig {
    match period {
        Period::Daily => cfg.daily,
        Period::Weekly => cfg.weekly,
        Period::Monthly => cfg.monthly,
    }
}

/// Whether `period` has a trigger on `day`.
pub fn fires_on(period: Period, day: Date) -> bool {
    match period {
        Period::Daily => true,
        Period::Weekly => day.weekday() == Weekday::Monday,
        Period::Monthly => day.day() == 1,
    }
}

/// First trigger strictly after `now`, or `None` past the end of the
/// supported calendar.
pub fn next_fire(now: OffsetDateTime, period: Period, at: Time, offset: UtcOffset) -> Option<OffsetDateTime> {
    let local = now.to_offset(offset);
    let mut day = local.date();

    // a month never has more than 31 days
    for _ in 0..=31 {
        let candidate = day.with_time(at).assume_offset(offset);
        if candidate > local && fires_on(period, day) {
            return Some(candidate);
        }
        day = day.next_day()?;
    }
    None
}

/// Spawn one task per enabled period. Each task sleeps until its next
/// trigger, runs the report and logs the result; a failed run never stops
/// the schedule.
pub fn spawn_schedules(service: Arc<ReportService>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    for period in Period::ALL {
        let schedule = schedule_for(service.settings(), period);
        if !schedule.enabled {
            tracing::info!(%period, "report schedule disabled");
            continue;
        }

        let svc = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            run_schedule(svc, period, schedule.time).await;
        }));
    }

    handles
}

async fn run_schedule(service: Arc<ReportService>, period: Period, at: Time) {
    let offset = service.settings().utc_offset;
    tracing::info!(%period, %at, %offset, "report schedule started");

    loop {
        let now = OffsetDateTime::now_utc();
        let Some(fire_at) = next_fire(now, period, at, offset) else {
            tracing::error!(%period, "no further trigger time, stopping schedule");
            return;
        };

        tracing::debug!(%period, %fire_at, "sleeping until next report");
        tokio::time::sleep((fire_at - now).unsigned_abs()).await;

        match service.run_report_at(period, fire_at).await {
            Ok(ReportOutcome::Sent) => {}
            Ok(ReportOutcome::Skipped) => tracing::info!(%period, "scheduled report skipped, no data"),
            Err(e) => tracing::error!(%period, error = %e, "scheduled report failed"),
        }
    }
}

/// Drive ingestion to completion, then keep the report schedules running.
///
/// The end of ingestion, clean or not, is logged and never cancels the
/// schedules; this returns once every schedule task has finished.
pub async fn run_alongside<F>(ingest: F, schedules: Vec<JoinHandle<()>>)
where
    F: Future<Output = Result<(), PipelineError>>,
{
    match ingest.await {
        Ok(()) => tracing::warn!("ingest pipeline stopped"),
        Err(e) => tracing::error!(error = %e, "ingest pipeline failed"),
    }

    if schedules.is_empty() {
        return;
    }
    tracing::info!(count = schedules.len(), "ingestion ended, report schedules keep running");

    for res in futures::future::join_all(schedules).await {
        if let Err(e) = res {
            tracing::error!(error = %e, "report schedule task aborted");
        }
    }
}
