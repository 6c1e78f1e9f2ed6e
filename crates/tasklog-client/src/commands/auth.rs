//! Authentication commands.

use std::path::PathBuf;

use tasklog_providers::google::{GoogleCalendar, OAuthCredentials};
use tracing::info;

use crate::config::{AppConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

/// Runs the Google OAuth consent flow and caches the tokens.
///
/// Credentials come from `--client-id`/`--client-secret`, a
/// `--credentials-file`, or the `[google]` section, in that order.
pub async fn google(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
    config: &AppConfig,
) -> ClientResult<()> {
    let credentials =
        resolve_google_credentials(client_id, client_secret, credentials_file, &config.google)?;
    let google_config = config.google.provider_config_with(credentials)?;
    let token_path = google_config.token_path.clone();
    let calendar = GoogleCalendar::new(google_config)?;

    if !force && calendar.is_authenticated().await && !calendar.needs_reauth().await {
        println!("Already authorized with Google Calendar.");
        println!("Use --force to authorize again.");
        return Ok(());
    }

    println!("Starting Google Calendar authorization...");
    println!("A browser window will open; if it does not, open the URL logged below.");
    println!();

    calendar.authenticate().await?;

    info!(path = %token_path.display(), "Google authorization successful");
    println!("Authorization saved to {}", token_path.display());
    println!("You can now run 'tasklog cleanup'.");
    Ok(())
}

/// Picks the OAuth client credentials.
///
/// Priority (highest to lowest):
/// 1. `--client-id` + `--client-secret` (or their environment variables)
/// 2. `--credentials-file` (Google Cloud Console JSON)
/// 3. `[google]` in `config.toml`, with secret references resolved
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    settings: &GoogleSettings,
) -> ClientResult<OAuthCredentials> {
    match (cli_client_id, cli_client_secret) {
        (Some(id), Some(secret)) => return Ok(OAuthCredentials::new(id, secret)),
        (None, None) => {}
        _ => {
            return Err(ClientError::Config(
                "both --client-id and --client-secret are required when passing credentials"
                    .to_string(),
            ));
        }
    }

    if let Some(path) = cli_credentials_file {
        return OAuthCredentials::from_file(&path).map_err(|e| {
            ClientError::Config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e.message()
            ))
        });
    }

    settings.resolve_credentials()
}
