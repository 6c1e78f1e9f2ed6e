//! CouchDB `_find` client.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tasklog_core::{TASKS_COLLECTION, TaskRecord};
use tracing::{debug, trace, warn};

use crate::BoxFuture;
use crate::context::RunContext;
use crate::error::{ProviderError, ProviderResult};

use super::TaskStore;
use super::config::CouchConfig;

const PROVIDER: &str = "couchdb";

/// Task store backed by a CouchDB database.
///
/// Documents are selected with `{"db": {"$eq": "Tasks"}}` and fetched in
/// pages of `page_size`, following the returned bookmark.
#[derive(Debug)]
pub struct CouchStore {
    client: Client,
    config: CouchConfig,
}

impl CouchStore {
    pub fn new(config: CouchConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client")
                    .with_provider(PROVIDER)
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CouchConfig {
        &self.config
    }

    /// Request body for one page.
    fn find_body(&self, bookmark: Option<&str>) -> Value {
        let mut body = json!({
            "selector": { "db": { "$eq": TASKS_COLLECTION } },
            "limit": self.config.page_size,
        });
        if let Some(bookmark) = bookmark {
            body["bookmark"] = Value::from(bookmark);
        }
        body
    }

    async fn find_page(&self, bookmark: Option<&str>) -> ProviderResult<FindResponse> {
        let url = self.config.find_url()?;
        trace!(%url, ?bookmark, "POST _find");

        let mut request = self.client.post(url).json(&self.find_body(bookmark));
        if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_transport("_find", e).with_provider(PROVIDER))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::invalid_response("failed to read _find response")
                .with_provider(PROVIDER)
                .with_source(e)
        })?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, None, &body).with_provider(PROVIDER));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse _find response: {e}"))
                .with_provider(PROVIDER)
        })
    }

    /// Fetches every page, in order.
    pub async fn fetch_all(&self, ctx: &RunContext) -> ProviderResult<Vec<TaskRecord>> {
        let limit = self.config.page_size;
        let mut records = Vec::new();
        let mut bookmark: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = ctx.run("_find", self.find_page(bookmark.as_deref())).await?;
            pages += 1;

            if let Some(ref warning) = page.warning {
                warn!(database = %self.config.database, %warning, "document store warning");
            }

            let count = page.docs.len();
            records.extend(page.docs.into_iter().filter_map(decode_task));

            let next = page.bookmark.filter(|b| !b.is_empty() && b != "nil");
            let exhausted = count < limit || next.is_none() || next == bookmark;
            if exhausted {
                break;
            }
            bookmark = next;
        }

        debug!(
            database = %self.config.database,
            pages,
            records = records.len(),
            "fetched task records"
        );
        Ok(records)
    }
}

fn decode_task(doc: Value) -> Option<TaskRecord> {
    match serde_json::from_value::<TaskRecord>(doc) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(error = %e, "skipping malformed task document");
            None
        }
    }
}

impl TaskStore for CouchStore {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn find_tasks<'a>(
        &'a self,
        ctx: &'a RunContext,
    ) -> BoxFuture<'a, ProviderResult<Vec<TaskRecord>>> {
        Box::pin(self.fetch_all(ctx))
    }
}

/// Body of a `_find` response.
#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    docs: Vec<Value>,
    #[serde(default)]
    bookmark: Option<String>,
    #[serde(default)]
    warning: Option<String>,
}
