//! Sequential deletion of remote events.

use serde::Serialize;
use std::collections::HashSet;
use tasklog_core::RemoteEvent;
use tracing::{debug, info, instrument, warn};

use crate::calendar::CalendarApi;
use crate::context::RunContext;
use crate::error::ProviderError;

/// A delete call that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub id: String,
    pub reason: String,
}

/// Outcome of a deletion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// Ids deleted, in the order they were issued.
    pub deleted: Vec<String>,
    /// Events without an id; nothing to call.
    pub skipped_without_id: usize,
    /// Repeated ids within the same pass, not re-issued.
    pub skipped_duplicate: usize,
    pub failed: Vec<FailedDeletion>,
    /// Set when the run was cancelled or hit its deadline mid-pass.
    pub interrupted: bool,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.id.as_str()).collect()
    }
}

/// Deletes events one at a time, in the given order.
///
/// Each id is attempted at most once per pass. A failed call is logged and
/// the pass moves on to the next event; an interrupted run context stops the
/// pass, leaving the remaining events untouched.
pub struct EventDeleter<'a> {
    api: &'a dyn CalendarApi,
    calendar_id: String,
}

impl<'a> EventDeleter<'a> {
    pub fn new(api: &'a dyn CalendarApi, calendar_id: impl Into<String>) -> Self {
        Self {
            api,
            calendar_id: calendar_id.into(),
        }
    }

    #[instrument(skip_all, fields(provider = self.api.name(), calendar = %self.calendar_id, events = events.len()))]
    pub async fn delete_all(&self, events: &[RemoteEvent], ctx: &RunContext) -> DeletionReport {
        let mut report = DeletionReport::default();
        let mut attempted: HashSet<&str> = HashSet::new();

        for event in events {
            let Some(id) = event.id.as_deref() else {
                debug!(title = event.display_title(), "event has no id, skipping");
                report.skipped_without_id += 1;
                continue;
            };

            if !attempted.insert(id) {
                report.skipped_duplicate += 1;
                continue;
            }

            let call = self.api.delete_event(&self.calendar_id, id);
            match ctx.run("delete event", call).await {
                Ok(()) => {
                    info!(id, title = event.display_title(), "deleted instant event");
                    report.deleted.push(id.to_string());
                }
                Err(e) if e.code().is_interruption() => {
                    warn!(id, error = %e, "deletion pass interrupted");
                    report.interrupted = true;
                    break;
                }
                Err(e) => {
                    warn!(id, error = %e, "failed to delete event");
                    report.failed.push(failure(id, &e));
                }
            }
        }

        debug!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            without_id = report.skipped_without_id,
            "deletion pass finished"
        );
        report
    }
}

fn failure(id: &str, err: &ProviderError) -> FailedDeletion {
    FailedDeletion {
        id: id.to_string(),
        reason: err.to_string(),
    }
}
