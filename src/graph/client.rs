//! Microsoft Graph HTTP transport.
//!
//! Attaches the bearer token, decodes JSON and turns non-success responses
//! into `GraphError::Api`. Requests are sent once; retrying is the caller's
//! decision.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::auth::TokenCache;
use crate::core::config::GraphConfig;
use crate::core::pagination::{ODataPage, PageFetcher};
use crate::errors::{GraphError, GraphResult};

pub const API_VERSION: &str = "v1.0";

#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    code: String,
    message: String,
}

#[derive(Debug)]
pub struct GraphClient {
    http_client: reqwest::Client,
    token_cache: TokenCache,
    base_url: String,
}

impl GraphClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the Graph
    /// endpoint is not a valid URL.
    pub fn new(config: &GraphConfig) -> GraphResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = format!("{}/{}", config.cloud.graph_endpoint(), API_VERSION);
        url::Url::parse(&base_url)?;

        Ok(Self {
            token_cache: TokenCache::new(config, http_client.clone()),
            http_client,
            base_url,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the versioned Graph root.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn token_cache(&self) -> &TokenCache {
        &self.token_cache
    }

    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let response = self.send(self.request(Method::GET, url).await?).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> GraphResult<T> {
        let request = self.request(Method::POST, url).await?.json(body);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// POST whose success response has no body (`204 No Content`).
    #[instrument(skip(self, body))]
    pub async fn post_no_content<B: Serialize + Sync>(&self, url: &str, body: &B) -> GraphResult<()> {
        let request = self.request(Method::POST, url).await?.json(body);
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, body))]
    pub async fn patch<B: Serialize + Sync>(&self, url: &str, body: &B) -> GraphResult<()> {
        let request = self.request(Method::PATCH, url).await?.json(body);
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, url: &str) -> GraphResult<()> {
        self.send(self.request(Method::DELETE, url).await?).await?;
        Ok(())
    }

    async fn request(&self, method: Method, url: &str) -> GraphResult<RequestBuilder> {
        let token = self.token_cache.get_token().await?;
        Ok(self.http_client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> GraphResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.token_cache.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Graph request failed with {}: {}", status, body);
        Err(api_error(status, &body))
    }
}

fn api_error(status: reqwest::StatusCode, body: &str) -> GraphError {
    match serde_json::from_str::<ODataError>(body) {
        Ok(odata) => GraphError::Api {
            status: Some(status.as_u16()),
            code: odata.error.code,
            message: odata.error.message,
        },
        Err(_) => GraphError::Api {
            status: Some(status.as_u16()),
            code: status.to_string(),
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl<T> PageFetcher<T> for GraphClient
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, link: &str) -> GraphResult<ODataPage<T>> {
        self.get(link).await
    }
}
