//! OAuth 2.0 authorization code flow with PKCE for Google APIs.
//!
//! A loopback listener on `127.0.0.1` receives the redirect at
//! `/oauth2callback`. The browser is opened on the consent page; if that
//! fails the URL is printed so it can be copied by hand. The code is then
//! exchanged, together with the PKCE verifier, for an access token and a
//! refresh token.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;
use super::tokens::TokenInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Path the consent page redirects to.
pub const CALLBACK_PATH: &str = "/oauth2callback";

/// Verifier entropy in bytes, before encoding.
const CODE_VERIFIER_LENGTH: usize = 32;

/// How long to wait for the user to finish the consent page.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const PROVIDER: &str = "google";

/// Talks to Google's OAuth endpoints.
#[derive(Debug)]
pub struct OAuthClient {
    config: GoogleConfig,
    http_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client")
                    .with_provider(PROVIDER)
                    .with_source(e)
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Runs the interactive consent flow and returns fresh tokens.
    pub async fn authorize(&self) -> ProviderResult<TokenInfo> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_loopback(self.config.loopback_port_range)?;
        let redirect_uri = format!("http://localhost:{port}{CALLBACK_PATH}");
        let auth_url = pkce.build_auth_url(
            &self.config.credentials.client_id,
            &redirect_uri,
            &self.config.scopes,
        );

        info!(port, "waiting for OAuth consent in the browser");
        debug!(%auth_url, "authorization URL");

        if let Err(e) = open::that(&auth_url) {
            warn!(error = %e, "failed to open browser");
            eprintln!("\nOpen this URL in your browser to authorize tasklog:\n\n{auth_url}\n");
        }

        let (code, state) = wait_for_callback(listener).await?;
        if state != pkce.state {
            return Err(ProviderError::authentication("OAuth state mismatch").with_provider(PROVIDER));
        }

        info!("received authorization code, exchanging for tokens");
        let response = self
            .token_request(&[
                ("client_id", self.config.credentials.client_id.as_str()),
                ("client_secret", self.config.credentials.client_secret.as_str()),
                ("code", code.as_str()),
                ("code_verifier", pkce.verifier.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .await?;

        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            self.config.scopes.clone(),
        ))
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, tokens: TokenInfo) -> ProviderResult<TokenInfo> {
        let refresh_token = tokens.refresh_token.clone().ok_or_else(|| {
            ProviderError::authentication("no refresh token cached, run 'tasklog auth google'")
                .with_provider(PROVIDER)
        })?;

        let response = self
            .token_request(&[
                ("client_id", self.config.credentials.client_id.as_str()),
                ("client_secret", self.config.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        info!("refreshed access token");
        Ok(tokens.refreshed(
            response.access_token,
            response.expires_in,
            response.refresh_token,
        ))
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport("token request", e).with_provider(PROVIDER))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::invalid_response("failed to read token response")
                .with_provider(PROVIDER)
                .with_source(e)
        })?;

        if !status.is_success() {
            // 400 invalid_grant means the refresh token was revoked.
            return Err(ProviderError::authentication(format!(
                "token endpoint rejected the request ({status}): {}",
                body.trim()
            ))
            .with_provider(PROVIDER));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {e}"))
                .with_provider(PROVIDER)
        })
    }
}

/// Binds the first free port in `range`.
fn bind_loopback(range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in range.0..=range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            debug!(port, "bound OAuth loopback listener");
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no free port for the OAuth redirect in {}-{}",
        range.0, range.1
    )))
}

/// Accepts connections on a helper thread until the redirect arrives.
async fn wait_for_callback(listener: TcpListener) -> ProviderResult<(String, String)> {
    let (tx, rx) = oneshot::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = handle_callback(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "failed to accept OAuth callback connection"),
            }
        }
    });

    match tokio::time::timeout(CALLBACK_TIMEOUT, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ProviderError::internal("OAuth callback listener stopped")),
        Err(_) => Err(ProviderError::authentication("timed out waiting for OAuth consent")),
    }
}

/// Parses one HTTP request; `None` for requests that are not the redirect.
fn handle_callback(mut stream: TcpStream) -> Option<ProviderResult<(String, String)>> {
    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let mut parts = request_line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        return None;
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != CALLBACK_PATH {
        return None;
    }

    let params = parse_query(query);
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    let (code, state, error) = (param("code"), param("state"), param("error"));

    let page = if error.is_none() && code.is_some() {
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
        <html><body><h1>tasklog is authorized</h1>\
        <p>You can close this window and return to the terminal.</p></body></html>"
    } else {
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
        <html><body><h1>Authorization failed</h1>\
        <p>You can close this window.</p></body></html>"
    };
    let _ = stream.write_all(page.as_bytes());
    let _ = stream.flush();

    if let Some(error) = error {
        return Some(Err(ProviderError::authentication(format!(
            "authorization denied: {error}"
        ))));
    }

    Some(match code {
        Some(code) => Ok((code, state.unwrap_or_default())),
        None => Err(ProviderError::authentication(
            "callback did not include an authorization code",
        )),
    })
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| {
            let decode = |s: &str| {
                urlencoding::decode(&s.replace('+', " "))
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            };
            (decode(k), decode(v))
        })
        .collect()
}

/// PKCE verifier, challenge and CSRF state for one flow (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    /// Base64url SHA-256 of the verifier.
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        format!(
            "{GOOGLE_AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
