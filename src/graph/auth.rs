//! Application token for one directory.
//!
//! A `GraphClient` talks to a single tenant with a single app registration,
//! so there is exactly one cached bearer token. It is fetched with the OAuth2
//! client-credentials grant and reused until it is within the refresh window
//! of its expiry, or until Graph answers 401 and the transport drops it.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::core::config::GraphConfig;
use crate::errors::{GraphError, GraphResult};

/// Tokens are refreshed this long before the identity platform expires them.
const REFRESH_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct AppToken {
    bearer: String,
    refresh_after: DateTime<Utc>,
}

impl AppToken {
    /// Builds a token from the endpoint's answer, rejecting lifetimes that
    /// cannot be represented as a point in time.
    fn issued(response: TokenResponse, now: DateTime<Utc>) -> GraphResult<Self> {
        let lifetime = Duration::try_seconds(response.expires_in).ok_or_else(|| {
            GraphError::Auth(format!("invalid expires_in {}", response.expires_in))
        })?;
        let expires_at = now.checked_add_signed(lifetime).ok_or_else(|| {
            GraphError::Auth(format!("invalid expires_in {}", response.expires_in))
        })?;
        let refresh_after = expires_at
            .checked_sub_signed(Duration::minutes(REFRESH_WINDOW_MINUTES))
            .unwrap_or(expires_at);

        Ok(Self {
            bearer: response.access_token,
            refresh_after,
        })
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_after
    }
}

/// Bearer token for the application, refreshed shortly before it expires.
pub struct TokenCache {
    token_url: String,
    scope: String,
    client_id: String,
    client_secret: String,
    http_client: reqwest::Client,
    current: RwLock<Option<AppToken>>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    #[must_use]
    pub fn new(config: &GraphConfig, http_client: reqwest::Client) -> Self {
        Self {
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                config.cloud.login_endpoint(),
                config.tenant_id
            ),
            scope: format!("{}/.default", config.cloud.graph_endpoint()),
            client_id: config.app_id.clone(),
            client_secret: config.secret.clone(),
            http_client,
            current: RwLock::new(None),
        }
    }

    /// Returns the cached bearer token, requesting a new one when it is
    /// missing or due for refresh.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Auth` if the token endpoint is unreachable,
    /// rejects the credentials or answers with an unusable token.
    #[instrument(skip(self), fields(client_id = %self.client_id))]
    pub async fn get_token(&self) -> GraphResult<String> {
        if let Some(token) = self.current.read().await.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.bearer.clone());
            }
        }

        let token = self.request_token().await?;
        let bearer = token.bearer.clone();
        *self.current.write().await = Some(token);
        Ok(bearer)
    }

    async fn request_token(&self) -> GraphResult<AppToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GraphError::Auth(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Auth(format!(
                "token request rejected with {status}: {body}"
            )));
        }

        let issued: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Auth(format!("malformed token response: {e}")))?;

        debug!(expires_in = issued.expires_in, "Acquired application token");
        AppToken::issued(issued, Utc::now())
    }

    /// Forgets the cached token so the next call requests a new one.
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}
