//! Document store connection settings.

use std::time::Duration;
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Connection settings for a CouchDB-compatible document store.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `https://couch.example.com/`.
    pub url: Url,

    /// Database holding the task documents.
    pub database: String,

    /// Username for HTTP basic authentication.
    pub username: Option<String>,

    /// Password for HTTP basic authentication.
    pub password: Option<String>,

    /// Documents requested per `_find` call.
    pub page_size: usize,

    /// Per-request timeout.
    pub timeout: Duration,

    pub user_agent: String,
}

impl CouchConfig {
    /// CouchDB's own default `_find` limit.
    pub const DEFAULT_PAGE_SIZE: usize = 25;

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates settings for `database` on the server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>, database: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(url.as_ref())?,
            database: database.into(),
            username: None,
            password: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("tasklog/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the page size. Zero is clamped to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// `{url}/{database}/_find`, with the database name percent-encoded.
    pub fn find_url(&self) -> ProviderResult<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ProviderError::configuration(format!("{} cannot be used as a base URL", self.url))
            })?
            .pop_if_empty()
            .push(&self.database)
            .push("_find");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CouchConfig::new("https://couch.example.com", "tasks").unwrap();
        assert_eq!(config.page_size, CouchConfig::DEFAULT_PAGE_SIZE);
        assert!(!config.has_credentials());
    }

    #[test]
    fn find_url_joins_database() {
        let config = CouchConfig::new("https://couch.example.com/", "tasks").unwrap();
        assert_eq!(
            config.find_url().unwrap().as_str(),
            "https://couch.example.com/tasks/_find"
        );
    }

    #[test]
    fn find_url_keeps_prefix_and_encodes_name() {
        let config = CouchConfig::new("https://example.com/couch", "my/db").unwrap();
        assert_eq!(
            config.find_url().unwrap().as_str(),
            "https://example.com/couch/my%2Fdb/_find"
        );
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let config = CouchConfig::new("http://localhost:5984", "db")
            .unwrap()
            .with_page_size(0);
        assert_eq!(config.page_size, 1);
    }

    #[test]
    fn invalid_url_returns_error() {
        assert!(CouchConfig::new("not a url", "db").is_err());
    }

    #[test]
    fn non_base_url_is_a_configuration_error() {
        let config = CouchConfig::new("mailto:someone@example.com", "db").unwrap();
        assert!(config.find_url().is_err());
    }
}
