//! Google Calendar API v3 HTTP client.
//!
//! Stateless apart from the connection pool: every call takes the bearer
//! token to use, so token refresh stays in [`super::GoogleCalendar`].

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tasklog_core::RemoteEvent;
use tracing::{debug, trace};

use crate::calendar::{EventPage, ListQuery};
use crate::error::{ProviderError, ProviderResult};

const PROVIDER: &str = "google";

/// Low-level Calendar API client.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(
        api_base: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client")
                    .with_provider(PROVIDER)
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            api_base: api_base.into(),
        })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }

    /// `GET /calendars/{id}/events` for one page.
    pub async fn list_events_page(
        &self,
        access_token: &str,
        query: &ListQuery,
    ) -> ProviderResult<EventPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("timeMax", query.time_max.to_rfc3339()),
            ("singleEvents", query.single_events.to_string()),
        ];
        if query.order_by_start {
            params.push(("orderBy", "startTime".to_string()));
        }
        if let Some(max) = query.max_results {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(ref token) = query.page_token {
            params.push(("pageToken", token.clone()));
        }

        let url = self.events_url(&query.calendar_id);
        trace!(%url, page_token = ?query.page_token, "listing events");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport("list events", e).with_provider(PROVIDER))?;

        let body = read_success_body(response).await?;
        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse event list: {e}"))
                .with_provider(PROVIDER)
        })?;

        debug!(
            items = list.items.len(),
            more = list.next_page_token.is_some(),
            "listed events page"
        );
        Ok(EventPage {
            items: list.items,
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// `DELETE /calendars/{id}/events/{eventId}`.
    ///
    /// `410 Gone` means the event is already deleted and counts as success.
    pub async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> ProviderResult<()> {
        let url = format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        );
        trace!(%url, "deleting event");

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport("delete event", e).with_provider(PROVIDER))?;

        if response.status() == StatusCode::GONE {
            debug!(event_id, "event already deleted");
            return Ok(());
        }

        read_success_body(response).await.map(|_| ())
    }
}

/// Returns the body of a 2xx response, or the classified error.
async fn read_success_body(response: Response) -> ProviderResult<String> {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());

    let body = response.text().await.map_err(|e| {
        ProviderError::invalid_response("failed to read response body")
            .with_provider(PROVIDER)
            .with_source(e)
    })?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(ProviderError::from_status(status, retry_after, &body).with_provider(PROVIDER))
    }
}

/// Body of `events.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<RemoteEvent>,
    #[serde(default)]
    next_page_token: Option<String>,
}
