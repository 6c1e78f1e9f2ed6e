//! [`CalendarApi`] implementation for Google Calendar.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::BoxFuture;
use crate::calendar::{CalendarApi, EventPage, ListQuery};
use crate::error::{ProviderError, ProviderResult};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::{TokenInfo, TokenStorage};

/// Google Calendar with cached OAuth tokens.
///
/// Tokens are read from the cache once at construction. Expired access
/// tokens are refreshed on demand and written back to the cache.
pub struct GoogleCalendar {
    config: GoogleConfig,
    storage: TokenStorage,
    oauth: OAuthClient,
    client: GoogleCalendarClient,
    tokens: Mutex<Option<TokenInfo>>,
}

impl GoogleCalendar {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let storage = TokenStorage::new(&config.token_path);
        let tokens = storage.load().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable token cache");
            None
        });

        let oauth = OAuthClient::new(config.clone())?;
        let client = GoogleCalendarClient::new(&config.api_base, config.timeout, &config.user_agent)?;

        Ok(Self {
            config,
            storage,
            oauth,
            client,
            tokens: Mutex::new(tokens),
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Runs the browser consent flow and caches the new tokens.
    pub async fn authenticate(&self) -> ProviderResult<()> {
        let tokens = self.oauth.authorize().await?;
        self.storage.save(&tokens)?;
        *self.tokens.lock().await = Some(tokens);
        info!(path = %self.storage.path().display(), "Google authorization saved");
        Ok(())
    }

    /// True when cached tokens are usable now or can be refreshed.
    pub async fn is_authenticated(&self) -> bool {
        self.tokens
            .lock()
            .await
            .as_ref()
            .is_some_and(TokenInfo::is_usable)
    }

    /// True when there are no tokens or they lack a configured scope.
    pub async fn needs_reauth(&self) -> bool {
        match self.tokens.lock().await.as_ref() {
            None => true,
            Some(tokens) => !tokens.has_scopes(&self.config.scopes),
        }
    }

    /// Drops cached tokens from memory and disk.
    pub async fn logout(&self) -> ProviderResult<()> {
        *self.tokens.lock().await = None;
        self.storage.clear()
    }

    /// Returns a valid access token, refreshing it if needed.
    async fn access_token(&self) -> ProviderResult<String> {
        let mut guard = self.tokens.lock().await;
        let tokens = guard.take().ok_or_else(|| {
            ProviderError::authentication("not authorized, run 'tasklog auth google'")
                .with_provider("google")
        })?;

        if !tokens.is_expired() {
            let access = tokens.access_token.clone();
            *guard = Some(tokens);
            return Ok(access);
        }

        debug!("access token expired, refreshing");
        let fallback = tokens.clone();
        let refreshed = match self.oauth.refresh(tokens).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                *guard = Some(fallback);
                return Err(e);
            }
        };

        if let Err(e) = self.storage.save(&refreshed) {
            warn!(error = %e, "failed to persist refreshed token");
        }
        let access = refreshed.access_token.clone();
        *guard = Some(refreshed);
        Ok(access)
    }
}

impl CalendarApi for GoogleCalendar {
    fn name(&self) -> &str {
        "google"
    }

    fn list_events_page<'a>(
        &'a self,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, ProviderResult<EventPage>> {
        Box::pin(async move {
            let token = self.access_token().await?;
            self.client.list_events_page(&token, query).await
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let token = self.access_token().await?;
            self.client.delete_event(&token, calendar_id, event_id).await
        })
    }
}
