//! Remote calendar API abstraction.
//!
//! The cleanup pipeline only needs two operations: list one page of events
//! and delete one event. [`CalendarApi`] is that seam; the Google client
//! implements it, and tests substitute in-memory fakes.

use chrono::{DateTime, Utc};
use tasklog_core::RemoteEvent;

use crate::BoxFuture;
use crate::error::ProviderResult;

/// Parameters for one list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub calendar_id: String,
    /// Upper bound on event start, fixed for a whole scan.
    pub time_max: DateTime<Utc>,
    /// Expand recurring events into single instances.
    pub single_events: bool,
    /// Ask for ascending start-time order.
    pub order_by_start: bool,
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
}

impl ListQuery {
    /// Query for the first page of `calendar_id` up to `time_max`.
    pub fn new(calendar_id: impl Into<String>, time_max: DateTime<Utc>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            time_max,
            single_events: true,
            order_by_start: true,
            max_results: None,
            page_token: None,
        }
    }

    pub fn with_max_results(mut self, max: u32) -> Self {
        self.max_results = Some(max);
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub items: Vec<RemoteEvent>,
    /// Continuation cursor; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// List and delete operations against a remote calendar.
pub trait CalendarApi: Send + Sync {
    /// Short name used in logs and error tags.
    fn name(&self) -> &str;

    /// Fetches a single page.
    fn list_events_page<'a>(&'a self, query: &'a ListQuery)
    -> BoxFuture<'a, ProviderResult<EventPage>>;

    /// Deletes one event by id.
    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
