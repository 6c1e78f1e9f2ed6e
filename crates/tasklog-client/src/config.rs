//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/tasklog/config.toml` by default. Every section is optional.
//!
//! ```toml
//! [store]
//! url = "https://couch.example.com"
//! database = "tasks"
//! username = "me"
//! password = "pass::couch/tasks"
//!
//! [google]
//! client_id = "env::GOOGLE_CLIENT_ID"
//! client_secret = "env::GOOGLE_CLIENT_SECRET"
//! calendar_id = "primary"
//!
//! [export]
//! output = "out.ics"
//!
//! [cleanup]
//! deadline_secs = 600
//! ```
//!
//! Both commands stop after [`DEFAULT_DEADLINE_SECS`] unless their section
//! sets `deadline_secs`.
//!
//! Credential values (`password`, `client_id`, `client_secret`) support
//! secret references, see [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tasklog_providers::CouchConfig;

use crate::cli::{CleanupArgs, ExportArgs};
use crate::error::{ClientError, ClientResult};

/// Overall run limit applied when a command has no `deadline_secs`.
pub const DEFAULT_DEADLINE_SECS: u64 = 300;

/// Configuration for the tasklog client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Document store holding the task records.
    pub store: StoreSettings,

    /// Google Calendar settings.
    pub google: GoogleSettings,

    pub export: ExportSettings,

    pub cleanup: CleanupSettings,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Server root URL.
    pub url: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    /// Supports `pass::` and `env::` prefixes.
    pub password: Option<String>,
    /// Documents per `_find` request.
    pub page_size: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// `[google]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,
    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,
    /// Calendar to clean, `primary` when unset.
    pub calendar_id: Option<String>,
    /// Token cache location.
    pub token_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// `[export]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub output: PathBuf,
    /// Overall time limit for fetching the task records.
    pub deadline_secs: Option<u64>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("out.ics"),
            deadline_secs: None,
        }
    }
}

/// `[cleanup]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    /// Overall time limit for listing and deleting.
    pub deadline_secs: Option<u64>,
    /// `maxResults` per list request. Server default when unset.
    pub page_size: Option<u32>,
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, a missing default file
    /// yields the default configuration.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {e}"))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tasklog")
    }

    /// Folds `export` flags (and their environment variables) into the config.
    pub fn apply_export_args(&mut self, args: &ExportArgs) {
        let store = &mut self.store;
        override_with(&mut store.url, &args.server);
        override_with(&mut store.database, &args.database);
        override_with(&mut store.username, &args.user);
        override_with(&mut store.password, &args.password);
        if let Some(ref output) = args.output {
            self.export.output = output.clone();
        }
        if args.deadline.is_some() {
            self.export.deadline_secs = args.deadline;
        }
    }

    /// Folds `cleanup` flags (and their environment variables) into the config.
    pub fn apply_cleanup_args(&mut self, args: &CleanupArgs) {
        if args.deadline.is_some() {
            self.cleanup.deadline_secs = args.deadline;
        }
        let google = &mut self.google;
        override_with(&mut google.calendar_id, &args.calendar);
        override_with(&mut google.client_id, &args.client_id);
        override_with(&mut google.client_secret, &args.client_secret);
    }

    /// Overall run deadline for export.
    pub fn export_deadline(&self) -> Duration {
        deadline_or_default(self.export.deadline_secs)
    }

    /// Overall run deadline for cleanup.
    pub fn cleanup_deadline(&self) -> Duration {
        deadline_or_default(self.cleanup.deadline_secs)
    }
}

fn deadline_or_default(secs: Option<u64>) -> Duration {
    Duration::from_secs(secs.unwrap_or(DEFAULT_DEADLINE_SECS))
}

fn override_with(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

fn required<'a>(value: &'a Option<String>, key: &str, hint: &str) -> ClientResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ClientError::Config(format!("{key} is not set ({hint})")))
}

impl StoreSettings {
    /// Validates the section and resolves secrets into a [`CouchConfig`].
    ///
    /// URL and database are required. Username and password are optional
    /// but must be given together.
    pub fn to_couch_config(&self) -> ClientResult<CouchConfig> {
        let url = required(&self.url, "store.url", "--server or SYNC_SERVER")?;
        let database = required(&self.database, "store.database", "--database or SYNC_DATABASE")?;

        let mut config = CouchConfig::new(url, database)
            .map_err(|e| ClientError::Config(format!("invalid store.url '{url}': {e}")))?;
        if !matches!(config.url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "store.url must be http or https, got '{}'",
                config.url.scheme()
            )));
        }

        match (&self.username, &self.password) {
            (Some(user), Some(password)) => {
                let password = crate::secret::resolve(password)
                    .map_err(|e| ClientError::Config(format!("store.password: {e}")))?;
                config = config.with_credentials(user, password);
            }
            (None, None) => {}
            _ => {
                return Err(ClientError::Config(
                    "store.username and store.password must be set together".to_string(),
                ));
            }
        }

        if let Some(size) = self.page_size {
            config = config.with_page_size(size);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Resolves credentials and builds a validated provider configuration.
    pub fn to_provider_config(&self) -> ClientResult<tasklog_providers::google::GoogleConfig> {
        self.provider_config_with(self.resolve_credentials()?)
    }

    /// Builds a provider configuration around credentials obtained elsewhere.
    pub fn provider_config_with(
        &self,
        credentials: tasklog_providers::google::OAuthCredentials,
    ) -> ClientResult<tasklog_providers::google::GoogleConfig> {
        use tasklog_providers::google::GoogleConfig;

        let mut config = GoogleConfig::new(credentials);
        if let Some(ref id) = self.calendar_id {
            config = config.with_calendar_id(id);
        }
        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config
            .validate()
            .map_err(|e| ClientError::Config(format!("[google] {e}")))?;
        Ok(config)
    }

    /// Resolves `client_id` and `client_secret`, expanding secret references.
    pub fn resolve_credentials(
        &self,
    ) -> ClientResult<tasklog_providers::google::OAuthCredentials> {
        use tasklog_providers::google::OAuthCredentials;

        let hint = "set it in [google], GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET, \
                    or run 'tasklog auth google --credentials-file <path>'";
        let raw_id = required(&self.client_id, "google.client_id", hint)?;
        let raw_secret = required(&self.client_secret, "google.client_secret", hint)?;

        let id = crate::secret::resolve(raw_id)
            .map_err(|e| ClientError::Config(format!("google.client_id: {e}")))?;
        let secret = crate::secret::resolve(raw_secret)
            .map_err(|e| ClientError::Config(format!("google.client_secret: {e}")))?;
        Ok(OAuthCredentials::new(id, secret))
    }
}
