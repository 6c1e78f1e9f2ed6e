//! Google Calendar backend.
//!
//! - OAuth 2.0 authorization code flow with PKCE and a loopback redirect
//! - Token cache with atomic writes and on-demand refresh
//! - `events.list` paging and `events.delete`
//!
//! ```ignore
//! use tasklog_providers::google::{GoogleCalendar, GoogleConfig, OAuthCredentials};
//!
//! let config = GoogleConfig::new(OAuthCredentials::new(client_id, client_secret));
//! let calendar = GoogleCalendar::new(config)?;
//! if calendar.needs_reauth().await {
//!     calendar.authenticate().await?;
//! }
//! ```

mod calendar;
mod client;
mod config;
mod oauth;
mod tokens;

pub use calendar::GoogleCalendar;
pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{CALLBACK_PATH, OAuthClient, PkceFlow};
pub use tokens::{TokenInfo, TokenStorage};
