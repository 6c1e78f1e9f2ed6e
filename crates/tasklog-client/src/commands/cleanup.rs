//! `tasklog cleanup`: delete zero- and negative-duration calendar events.
//!
//! ```text
//! CalendarPager ──► filter_instant_events ──► EventDeleter
//!   (all pages)       (all-day kept)          (one at a time)
//! ```

use serde::Serialize;
use tracing::{info, instrument};

use tasklog_core::{FilterOutcome, RemoteEvent, filter_instant_events};
use tasklog_providers::{
    CalendarApi, CalendarPager, DeletionReport, EventDeleter, FailedDeletion, RunContext,
};

use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};

/// An event selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: Option<String>,
    pub title: String,
    pub start: Option<String>,
}

impl From<&RemoteEvent> for Candidate {
    fn from(event: &RemoteEvent) -> Self {
        Self {
            id: event.id.clone(),
            title: event.display_title().to_string(),
            start: event.start.date_time.clone(),
        }
    }
}

/// Counts and ids for one cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub calendar_id: String,
    pub dry_run: bool,
    pub listed: usize,
    pub eligible: usize,
    pub skipped_all_day: usize,
    pub skipped_invalid: usize,
    /// Timed events with a positive duration.
    pub kept: usize,
    pub candidates: Vec<Candidate>,
    pub deleted: Vec<String>,
    pub skipped_without_id: usize,
    pub skipped_duplicate: usize,
    pub failed: Vec<FailedDeletion>,
    pub interrupted: bool,
}

impl CleanupSummary {
    fn from_parts(
        calendar_id: &str,
        dry_run: bool,
        listed: usize,
        outcome: &FilterOutcome,
        report: DeletionReport,
    ) -> Self {
        Self {
            calendar_id: calendar_id.to_string(),
            dry_run,
            listed,
            eligible: outcome.eligible.len(),
            skipped_all_day: outcome.skipped_all_day,
            skipped_invalid: outcome.skipped_invalid,
            kept: outcome.kept,
            candidates: outcome.eligible.iter().map(Candidate::from).collect(),
            deleted: report.deleted,
            skipped_without_id: report.skipped_without_id,
            skipped_duplicate: report.skipped_duplicate,
            failed: report.failed,
            interrupted: report.interrupted,
        }
    }

    /// Maps an unfinished run to the error the process exits with.
    pub fn into_result(self) -> ClientResult<Self> {
        if self.interrupted {
            let handled = self.deleted.len()
                + self.failed.len()
                + self.skipped_without_id
                + self.skipped_duplicate;
            let pending = self.eligible.saturating_sub(handled);
            return Err(ClientError::Interrupted(format!(
                "stopped with {pending} event(s) not processed"
            )));
        }
        if !self.failed.is_empty() {
            return Err(ClientError::CleanupIncomplete {
                failed: self.failed.into_iter().map(|f| f.id).collect(),
            });
        }
        Ok(self)
    }

    pub fn print(&self) {
        if self.dry_run {
            for candidate in &self.candidates {
                println!(
                    "would delete {} {:?} at {}",
                    candidate.id.as_deref().unwrap_or("<no id>"),
                    candidate.title,
                    candidate.start.as_deref().unwrap_or("?")
                );
            }
            println!(
                "{} of {} event(s) in '{}' would be deleted (dry run)",
                self.eligible, self.listed, self.calendar_id
            );
            return;
        }

        println!(
            "Deleted {} of {} instant event(s) in '{}' ({} listed, {} all-day skipped, {} invalid skipped)",
            self.deleted.len(),
            self.eligible,
            self.calendar_id,
            self.listed,
            self.skipped_all_day,
            self.skipped_invalid
        );
        for failure in &self.failed {
            println!("  failed {}: {}", failure.id, failure.reason);
        }
    }
}

/// Runs the cleanup against the calendar configured in `config`.
#[cfg(feature = "google")]
pub async fn run(config: &AppConfig, dry_run: bool, ctx: &RunContext) -> ClientResult<CleanupSummary> {
    use tasklog_providers::google::GoogleCalendar;

    let google_config = config.google.to_provider_config()?;
    let calendar_id = google_config.calendar_id.clone();
    let calendar = GoogleCalendar::new(google_config)?;
    if !calendar.is_authenticated().await {
        return Err(ClientError::Config(
            "not authorized with Google Calendar, run 'tasklog auth google'".to_string(),
        ));
    }

    cleanup(&calendar, &calendar_id, config.cleanup.page_size, dry_run, ctx).await
}

#[cfg(not(feature = "google"))]
pub async fn run(
    _config: &AppConfig,
    _dry_run: bool,
    _ctx: &RunContext,
) -> ClientResult<CleanupSummary> {
    Err(ClientError::Config(
        "tasklog was built without Google Calendar support".to_string(),
    ))
}

/// Lists every event up to now, keeps the instant ones and deletes them.
///
/// A listing failure aborts before anything is deleted. Deletion failures
/// are collected in the summary; see [`CleanupSummary::into_result`].
#[instrument(skip_all, fields(provider = api.name(), calendar = calendar_id, dry_run = dry_run))]
pub async fn cleanup(
    api: &dyn CalendarApi,
    calendar_id: &str,
    page_size: Option<u32>,
    dry_run: bool,
    ctx: &RunContext,
) -> ClientResult<CleanupSummary> {
    let events = CalendarPager::new(api, calendar_id)
        .with_page_size(page_size)
        .collect_all(ctx)
        .await?;
    let listed = events.len();
    let outcome = filter_instant_events(events);

    let report = if dry_run {
        DeletionReport::default()
    } else {
        EventDeleter::new(api, calendar_id)
            .delete_all(&outcome.eligible, ctx)
            .await
    };

    let summary = CleanupSummary::from_parts(calendar_id, dry_run, listed, &outcome, report);
    info!(
        listed = summary.listed,
        eligible = summary.eligible,
        skipped_all_day = summary.skipped_all_day,
        skipped_invalid = summary.skipped_invalid,
        deleted = summary.deleted.len(),
        failed = summary.failed.len(),
        interrupted = summary.interrupted,
        "cleanup finished"
    );
    Ok(summary)
}
