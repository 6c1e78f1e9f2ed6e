//! Google Calendar client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// OAuth 2.0 client credentials from the Google Cloud Console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Shape of a downloaded credentials JSON file.
///
/// Either an `installed`/`web` section or `client_id`/`client_secret` at
/// the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a Google credentials JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read credentials file {}",
                path.display()
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("failed to parse credentials JSON: {e}"))
        })?;

        if let Some(nested) = file.installed.or(file.web) {
            return Ok(Self::new(nested.client_id, nested.client_secret));
        }

        match (file.client_id, file.client_secret) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => Err(ProviderError::configuration(
                "credentials file needs an 'installed'/'web' section or root 'client_id'/'client_secret'",
            )),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.trim().is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Settings for the Google Calendar client and its OAuth flow.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,

    /// Token cache file. Defaults to
    /// `~/.local/share/tasklog/google-tokens.json`.
    pub token_path: PathBuf,

    /// Calendar to scan and delete from.
    pub calendar_id: String,

    /// Per-request timeout.
    pub timeout: Duration,

    pub user_agent: String,

    /// Ports tried, in order, for the OAuth loopback redirect.
    pub loopback_port_range: (u16, u16),

    pub scopes: Vec<String>,

    /// Calendar API root, without trailing slash.
    pub api_base: String,

    /// OAuth token endpoint.
    pub token_url: String,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_CALENDAR_ID: &'static str = "primary";

    pub const API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";

    pub const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Scopes needed to list and delete events.
    pub const SCOPES: [&'static str; 3] = [
        "https://www.googleapis.com/auth/calendar.readonly",
        "https://www.googleapis.com/auth/calendar.calendars",
        "https://www.googleapis.com/auth/calendar.events.owned",
    ];

    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_path: Self::default_token_path(),
            calendar_id: Self::DEFAULT_CALENDAR_ID.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("tasklog/{}", env!("CARGO_PKG_VERSION")),
            loopback_port_range: (3000, 3010),
            scopes: Self::SCOPES.iter().map(|s| s.to_string()).collect(),
            api_base: Self::API_BASE.to_string(),
            token_url: Self::TOKEN_URL.to_string(),
        }
    }

    pub fn default_token_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".local").join("share"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tasklog")
            .join("google-tokens.json")
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Points the client at another API root and token endpoint.
    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.token_url = token_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {e}"))?;

        if self.calendar_id.trim().is_empty() {
            return Err("calendar_id must not be empty".to_string());
        }

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }

        Ok(())
    }
}
