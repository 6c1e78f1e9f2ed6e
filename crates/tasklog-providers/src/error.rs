//! Error types for remote services.
//!
//! Every network collaborator (the task store, the calendar API, the OAuth
//! endpoints) reports failures as a [`ProviderError`]: a classification code,
//! a message, the service that produced it and an optional source.

use std::fmt;
use thiserror::Error;

/// Classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials missing, invalid or expired (401).
    AuthenticationFailed,
    /// Authenticated but not allowed (403).
    AuthorizationFailed,
    /// Connection failed, DNS, TLS or per-request timeout.
    NetworkError,
    /// Too many requests (429).
    RateLimited,
    /// 5xx from the remote service.
    ServerError,
    /// Body could not be read or decoded.
    InvalidResponse,
    /// Resource missing or already gone (404, 410).
    NotFound,
    /// Request rejected as malformed (400).
    BadRequest,
    /// Local configuration is unusable.
    ConfigurationError,
    /// The overall run deadline elapsed.
    DeadlineExceeded,
    /// The run was cancelled by the operator.
    Cancelled,
    /// Local I/O or unexpected state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if the failure is transient.
    ///
    /// Informational only: nothing in the pipelines retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns true if the run was stopped rather than failed by the remote.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Cancelled => "cancelled",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure talking to a remote service.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Service tag such as `"couchdb"` or `"google"`.
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::DeadlineExceeded, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Cancelled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Tags the error with the service that produced it.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Classifies a transport-level `reqwest` failure.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("{context}: request timed out")
        } else if err.is_connect() {
            format!("{context}: connection failed")
        } else {
            format!("{context}: request failed")
        };
        Self::network(message).with_source(err)
    }

    /// Maps a non-success HTTP status to an error.
    ///
    /// `retry_after` is the parsed `Retry-After` header in seconds, if any.
    pub fn from_status(
        status: reqwest::StatusCode,
        retry_after: Option<u64>,
        body: &str,
    ) -> Self {
        use reqwest::StatusCode;

        let detail = body.trim();
        match status {
            StatusCode::UNAUTHORIZED => {
                Self::authentication(format!("credentials rejected ({status})"))
            }
            StatusCode::FORBIDDEN => Self::authorization(format!("access denied ({status})")),
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Self::not_found(format!("resource not found ({status})"))
            }
            StatusCode::BAD_REQUEST => Self::bad_request(format!("bad request: {detail}")),
            StatusCode::TOO_MANY_REQUESTS => Self::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {s} seconds"))
                    .unwrap_or_default()
            )),
            s if s.is_server_error() => Self::server(format!("server error ({s}): {detail}")),
            s => Self::invalid_response(format!("unexpected status ({s}): {detail}")),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for remote operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
