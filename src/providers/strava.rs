// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Strava activity source
//!
//! Handles OAuth2 token exchange/refresh, persists tokens to a JSON file,
//! and normalizes Strava activities into [`ActivityRecord`]s. Only `Run`
//! and `VirtualRun` activities survive normalization.

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Config, StravaConfig};
use crate::constants::{files, strava};
use crate::models::{weekday_name, ActivityRecord};

use super::ActivitySource;

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stored OAuth tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp after which the access token is stale
    pub expires_at: Option<i64>,
}

impl TokenData {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| Utc::now().timestamp() > at)
            .unwrap_or(false)
    }
}

/// Strava-backed [`ActivitySource`]
pub struct StravaProvider {
    client: Client,
    config: StravaConfig,
    tokens: Mutex<Option<TokenData>>,
    tokens_path: PathBuf,
    api_base: String,
    token_url: String,
}

impl StravaProvider {
    /// Build a provider with an explicit tokens file location
    pub fn new(config: StravaConfig, tokens_path: PathBuf) -> Self {
        let tokens = Self::load_tokens(&tokens_path);
        Self {
            client: Client::new(),
            config,
            tokens: Mutex::new(tokens),
            tokens_path,
            api_base: strava::API_BASE.to_string(),
            token_url: strava::TOKEN_URL.to_string(),
        }
    }

    /// Build a provider storing tokens under the platform data dir
    pub fn from_config(config: &StravaConfig) -> Result<Self> {
        let tokens_path = Config::data_dir().join(files::TOKENS_FILE);
        Ok(Self::new(config.clone(), tokens_path))
    }

    /// Override the API base URL (used by tests to inject a mock server)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the token endpoint (used by tests to inject a mock server)
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// True when tokens have been stored from a previous `setup`
    pub fn is_connected(&self) -> bool {
        self.tokens.lock().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Install tokens directly and persist them
    pub fn set_tokens(&self, tokens: TokenData) -> Result<()> {
        self.save_tokens(&tokens)?;
        if let Ok(mut guard) = self.tokens.lock() {
            *guard = Some(tokens);
        }
        Ok(())
    }

    /// Build the authorization URL and the state parameter embedded in it
    pub fn authorization_url(&self) -> Result<(String, String)> {
        let client_id = self
            .config
            .client_id
            .as_ref()
            .context("Strava client ID not configured")?;

        let state = Uuid::new_v4().to_string();
        let mut url = url::Url::parse(strava::AUTH_URL)?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", self.config.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("approval_prompt", "force")
            .append_pair("scope", strava::OAUTH_SCOPE)
            .append_pair("state", &state);

        Ok((url.to_string(), state))
    }

    /// Exchange an authorization code for tokens and persist them
    pub async fn exchange_code(&self, code: &str) -> Result<()> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];

        let tokens = self.request_tokens(&params).await.context("Token exchange failed")?;
        info!("Strava authorization complete");
        self.set_tokens(tokens)
    }

    /// Refresh the access token using the stored refresh token
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenData> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let tokens = self.request_tokens(&params).await.context("Token refresh failed")?;
        info!("Strava access token refreshed");
        Ok(tokens)
    }

    async fn request_tokens(&self, params: &[(&str, &str)]) -> Result<TokenData> {
        let response = self.client.post(&self.token_url).form(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Strava token endpoint returned {status}: {body}");
        }

        Ok(response.json().await?)
    }

    /// Access token, refreshing first when stale
    async fn valid_access_token(&self) -> Result<String> {
        let current = self
            .tokens
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .context("Not authenticated with Strava. Run `running-coach setup` first")?;

        if !current.is_expired() {
            return Ok(current.access_token);
        }

        let refresh_token = current
            .refresh_token
            .as_deref()
            .context("Access token expired and no refresh token stored")?;

        let refreshed = self.refresh_access_token(refresh_token).await?;
        let access_token = refreshed.access_token.clone();
        self.set_tokens(refreshed)?;
        Ok(access_token)
    }

    fn credentials(&self) -> Result<(String, String)> {
        let client_id = self
            .config
            .client_id
            .clone()
            .context("Strava client ID not configured")?;
        let client_secret = self
            .config
            .client_secret
            .clone()
            .context("Strava client secret not configured")?;
        Ok((client_id, client_secret))
    }

    fn load_tokens(path: &PathBuf) -> Option<TokenData> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(tokens) => Some(tokens),
            Err(err) => {
                warn!("Ignoring unreadable tokens file {}: {err}", path.display());
                None
            }
        }
    }

    fn save_tokens(&self, tokens: &TokenData) -> Result<()> {
        if let Some(parent) = self.tokens_path.parent() {
            fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        let content = serde_json::to_string_pretty(tokens)?;
        fs::write(&self.tokens_path, content)
            .with_context(|| format!("Failed to write tokens file {}", self.tokens_path.display()))
    }
}

#[async_trait]
impl ActivitySource for StravaProvider {
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ActivityRecord>> {
        let token = self.valid_access_token().await?;

        // Request headroom beyond the cap since non-run activities are
        // filtered out after the fact.
        let per_page = (limit * 2).max(30);

        let response = self
            .client
            .get(format!("{}/athlete/activities", self.api_base))
            .bearer_auth(&token)
            .query(&[("per_page", per_page.to_string())])
            .send()
            .await
            .context("Failed to reach Strava API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Strava API returned {status}: {body}");
        }

        let raw: Vec<StravaActivity> = response
            .json()
            .await
            .context("Failed to parse Strava activities response")?;

        let mut runs: Vec<(NaiveDateTime, ActivityRecord)> = raw
            .into_iter()
            .filter(|a| matches!(a.activity_type.as_str(), "Run" | "VirtualRun"))
            .filter_map(|a| a.normalize())
            .collect();

        // The API already returns newest-first; sort defensively so the
        // analysis layer's ordering invariant holds regardless.
        runs.sort_by(|a, b| b.0.cmp(&a.0));
        runs.truncate(limit);

        Ok(runs.into_iter().map(|(_, record)| record).collect())
    }
}

/// Raw Strava activity, reduced to the fields normalization needs
#[derive(Debug, Deserialize)]
struct StravaActivity {
    #[serde(rename = "type")]
    activity_type: String,
    /// Local wall-clock start, RFC3339-shaped (`2024-01-15T08:00:00Z`)
    start_date_local: String,
    /// Elapsed time in seconds
    elapsed_time: u64,
    /// Distance in meters
    distance: f64,
    /// Average speed in m/s
    average_speed: Option<f64>,
}

impl StravaActivity {
    /// Normalize to an [`ActivityRecord`]; `None` when the start timestamp
    /// is unparsable
    fn normalize(self) -> Option<(NaiveDateTime, ActivityRecord)> {
        let stamp = self.start_date_local.get(..19)?;
        let start = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S").ok()?;

        let record = ActivityRecord {
            date: start.date(),
            start_time: start.format("%H:%M").to_string(),
            start_hour: start.hour() as u8,
            weekday: weekday_name(start.date()),
            duration_minutes: (self.elapsed_time / 60) as u32,
            distance_km: round2(self.distance / 1000.0),
            average_speed: self.average_speed.map(|mps| round2(mps * 3.6)),
        };

        Some((start, record))
    }
}

/// Run a one-shot callback listener and return the authorization code
///
/// Binds `127.0.0.1:port`, serves `/callback`, and resolves when Strava
/// redirects back with a code whose state matches. Gives up after the
/// timeout.
pub async fn wait_for_callback(port: u16, expected_state: String, timeout: Duration) -> Result<String> {
    use warp::Filter;

    let (code_tx, mut code_rx) = tokio::sync::mpsc::channel::<String>(1);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let route = warp::path("callback")
        .and(warp::query::<HashMap<String, String>>())
        .map(move |params: HashMap<String, String>| {
            match (params.get("code"), params.get("state")) {
                (Some(code), Some(state)) if *state == expected_state => {
                    let _ = code_tx.try_send(code.clone());
                    warp::reply::html(
                        "<html><body><h1>Success!</h1><p>You can close this window.</p></body></html>",
                    )
                }
                _ => warp::reply::html(
                    "<html><body><h1>Error</h1><p>No valid authorization code received.</p></body></html>",
                ),
            }
        });

    let (_addr, server) = warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], port), async {
        shutdown_rx.await.ok();
    });
    let server_handle = tokio::spawn(server);

    let result = tokio::time::timeout(timeout, code_rx.recv())
        .await
        .context("Timed out waiting for Strava authorization")?
        .context("Callback listener closed unexpectedly");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    result
}
