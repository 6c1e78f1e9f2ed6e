//! Configuration commands.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret::SecretRef;

const MASK: &str = "********";

/// Shows the configuration file path in effect.
pub fn path(explicit: Option<&Path>) -> ClientResult<()> {
    let (path, note) = match explicit {
        Some(path) => (path.to_path_buf(), ""),
        None => {
            let path = AppConfig::default_path();
            let note = if path.exists() { "" } else { " (not created yet)" };
            (path, note)
        }
    };
    println!("config: {}{note}", path.display());
    Ok(())
}

/// Dumps the effective configuration, plain-text secrets masked.
pub fn dump(config: &AppConfig) -> ClientResult<()> {
    println!("{}", render(config)?);
    Ok(())
}

fn render(config: &AppConfig) -> ClientResult<String> {
    let mut masked = config.clone();
    mask(&mut masked.store.password);
    mask(&mut masked.google.client_secret);
    toml::to_string_pretty(&masked)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {e}")))
}

/// References (`env::`, `pass::`) are not secret themselves and stay visible.
fn mask(value: &mut Option<String>) {
    if let Some(v) = value
        && matches!(SecretRef::parse(v), SecretRef::Plain(_))
    {
        *v = MASK.to_string();
    }
}

/// Validates every configured section, resolving secret references.
///
/// Sections left entirely empty are reported and skipped.
pub fn validate(config: &AppConfig) -> ClientResult<()> {
    let store = &config.store;
    if store.url.is_some() || store.database.is_some() {
        let couch = store.to_couch_config()?;
        println!("[store] ok: {} / {}", couch.url, couch.database);
    } else {
        println!("[store] not configured");
    }

    #[cfg(feature = "google")]
    {
        let google = &config.google;
        if google.client_id.is_some() || google.client_secret.is_some() {
            let provider = google.to_provider_config()?;
            println!("[google] ok: calendar '{}'", provider.calendar_id);
        } else {
            println!("[google] not configured");
        }
    }

    println!("Configuration is valid.");
    Ok(())
}
