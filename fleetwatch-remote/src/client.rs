//! HTTP session client for the remote management API.
//!
//! Holds one bearer-token session. Token state is owned by value and
//! mutated through `&mut self` — the sync loop is the only writer, so
//! no internal locking is needed.

use crate::error::{RemoteError, RemoteResult};
use crate::types::{AgentsEnvelope, AuthEnvelope, RemoteAgent};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

/// Client-assumed token lifetime. The API does not report the real TTL,
/// so the session is refreshed pessimistically after this long.
const TOKEN_LIFETIME_HOURS: i64 = 10;

/// Upper bound on the response-body excerpt carried in fetch errors.
const BODY_EXCERPT_LEN: usize = 2048;

/// Authenticated session against the remote agent-management API.
pub struct SessionClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    token: Option<String>,
    token_expiry: DateTime<Utc>,
}

impl SessionClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            token: None,
            token_expiry: Utc::now(),
        }
    }

    /// Seeds token state directly (for restoring a saved session).
    pub fn restore_session(&mut self, token: String, expires_at: DateTime<Utc>) {
        self.token = Some(token);
        self.token_expiry = expires_at;
    }

    pub fn has_session(&self) -> bool {
        self.token.is_some()
    }

    fn clear_session(&mut self) {
        self.token = None;
        self.token_expiry = Utc::now();
    }

    fn token_valid(&self) -> bool {
        self.token.is_some() && Utc::now() < self.token_expiry
    }

    /// Authenticates with basic credentials and caches the issued token.
    pub async fn login(&mut self) -> RemoteResult<()> {
        let url = format!("{}/security/user/authenticate", self.base_url);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::AuthRejected { status });
        }

        let envelope: AuthEnvelope = resp
            .json()
            .await
            .map_err(|e| RemoteError::AuthResponse(e.to_string()))?;

        self.token = Some(envelope.data.token);
        self.token_expiry = Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS);
        info!("authenticated against {}", self.base_url);
        Ok(())
    }

    /// Logs in only when there is no token or the cached one has expired.
    /// This is the sole gate on re-authentication frequency.
    pub async fn ensure_token(&mut self) -> RemoteResult<()> {
        if self.token_valid() {
            return Ok(());
        }
        self.login().await
    }

    /// Fetches the full agent inventory, retrying once on 401.
    ///
    /// A 401 burns the cached token unconditionally — even a freshly
    /// minted one — before the single re-authenticate-and-retry. A
    /// second 401 surfaces as a terminal fetch error.
    pub async fn fetch_all(&mut self) -> RemoteResult<Vec<RemoteAgent>> {
        self.ensure_token().await?;

        let mut resp = self.get_agents().await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            debug!("401 on GET /agents, discarding cached token");
            self.clear_session();
            self.ensure_token().await?;
            resp = self.get_agents().await?;
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Fetch {
                status,
                body: excerpt(body),
            });
        }

        let bytes = resp.bytes().await?;
        let envelope: AgentsEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::Envelope(e.to_string()))?;

        let mut agents = Vec::with_capacity(envelope.data.items.len());
        for item in &envelope.data.items {
            match RemoteAgent::from_item(item) {
                Ok(agent) => agents.push(agent),
                Err(err) => warn!("skipping undecodable agent item: {err}"),
            }
        }

        debug!("fetched {} agents", agents.len());
        Ok(agents)
    }

    async fn get_agents(&self) -> RemoteResult<reqwest::Response> {
        let url = format!("{}/agents", self.base_url);
        let token = self.token.as_deref().unwrap_or_default();
        Ok(self.http.get(&url).bearer_auth(token).send().await?)
    }
}

/// Bounds an error-path body at a char boundary for log hygiene.
fn excerpt(body: String) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body;
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
