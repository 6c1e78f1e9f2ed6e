//! Accumulation of a paginated event listing.

use chrono::{DateTime, Utc};
use tasklog_core::RemoteEvent;
use tracing::{debug, instrument};

use crate::calendar::{CalendarApi, ListQuery};
use crate::context::RunContext;
use crate::error::ProviderResult;

/// Walks every page of a calendar listing, strictly sequentially.
///
/// The upper time bound is captured once when the pager is built, so every
/// page of one scan uses the same `timeMax`.
pub struct CalendarPager<'a> {
    api: &'a dyn CalendarApi,
    calendar_id: String,
    time_max: DateTime<Utc>,
    page_size: Option<u32>,
}

impl<'a> CalendarPager<'a> {
    /// Pager over `calendar_id` bounded at the current instant.
    pub fn new(api: &'a dyn CalendarApi, calendar_id: impl Into<String>) -> Self {
        Self::with_time_max(api, calendar_id, Utc::now())
    }

    pub fn with_time_max(
        api: &'a dyn CalendarApi,
        calendar_id: impl Into<String>,
        time_max: DateTime<Utc>,
    ) -> Self {
        Self {
            api,
            calendar_id: calendar_id.into(),
            time_max,
            page_size: None,
        }
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn time_max(&self) -> DateTime<Utc> {
        self.time_max
    }

    fn first_query(&self) -> ListQuery {
        let query = ListQuery::new(&self.calendar_id, self.time_max);
        match self.page_size {
            Some(size) => query.with_max_results(size),
            None => query,
        }
    }

    /// Fetches all pages and concatenates their items in page order.
    ///
    /// Stops at the first page without a continuation cursor. Any page
    /// failure aborts the scan.
    #[instrument(skip_all, fields(provider = self.api.name(), calendar = %self.calendar_id))]
    pub async fn collect_all(&self, ctx: &RunContext) -> ProviderResult<Vec<RemoteEvent>> {
        let mut events = Vec::new();
        let mut query = self.first_query();
        let mut pages = 0usize;

        loop {
            let page = ctx
                .run("list events", self.api.list_events_page(&query))
                .await?;
            pages += 1;
            debug!(page = pages, items = page.items.len(), "fetched page");
            events.extend(page.items);

            match page.next_page_token {
                Some(token) => query.page_token = Some(token),
                None => break,
            }
        }

        debug!(pages, events = events.len(), time_max = %self.time_max, "listing complete");
        Ok(events)
    }
}
