//! OAuth token cache.
//!
//! Tokens live in a single JSON file, replaced atomically on every write and
//! readable only by the owner on Unix.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Access tokens are treated as expired this long before their real expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A cached token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Early expiry, already shortened by the safety margin.
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes the tokens were granted for.
    #[serde(default)]
    pub scopes: Vec<String>,
    pub last_refresh: DateTime<Utc>,
}

fn expiry_from(expires_in_secs: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in_secs.map(|secs| Utc::now() + Duration::seconds(secs - EXPIRY_MARGIN_SECS))
}

impl TokenInfo {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expiry_from(expires_in_secs),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Tokens without a known expiry are assumed valid.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Usable now, or refreshable.
    pub fn is_usable(&self) -> bool {
        !self.is_expired() || self.refresh_token.is_some()
    }

    /// Applies a refresh response. Google may rotate the refresh token.
    pub fn refreshed(
        mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        refresh_token: Option<String>,
    ) -> Self {
        self.access_token = access_token.into();
        self.expires_at = expiry_from(expires_in_secs);
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.last_refresh = Utc::now();
        self
    }
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cache. A missing file is `Ok(None)`.
    pub fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no token cache");
                return Ok(None);
            }
            Err(e) => {
                return Err(ProviderError::configuration(format!(
                    "failed to read token cache {}",
                    self.path.display()
                ))
                .with_source(e));
            }
        };

        let tokens = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to parse token cache {}: {e}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), "loaded token cache");
        Ok(Some(tokens))
    }

    /// Writes `tokens` through a temporary file and a rename.
    pub fn save(&self, tokens: &TokenInfo) -> ProviderResult<()> {
        let io_err = |what: &str, e: std::io::Error| {
            ProviderError::internal(format!("{what} {}", self.path.display())).with_source(e)
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| io_err("failed to create directory for", e))?;
        }

        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {e}")))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| io_err("failed to write", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| io_err("failed to restrict permissions on", e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| io_err("failed to replace", e))?;

        debug!(path = %self.path.display(), "saved token cache");
        Ok(())
    }

    /// Removes the cache file if present.
    pub fn clear(&self) -> ProviderResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "cleared token cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProviderError::internal(format!(
                "failed to remove token cache {}",
                self.path.display()
            ))
            .with_source(e)),
        }
    }
}
