use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{info, instrument, warn};

use crate::core::config::GraphConfig;
use crate::core::models::Domain;
use crate::core::pagination::{ODataPage, PageIterator};
use crate::core::retry::retry_with_observer;
use crate::errors::{GraphError, GraphResult};
use crate::graph::GraphClient;

/// Authenticated connection to one directory plus its default domain.
///
/// Built once per repository (or shared between repositories through an
/// `Arc`). The domain is resolved during [`DirectoryContext::connect`] and
/// never changes afterwards.
#[derive(Debug)]
pub struct DirectoryContext {
    config: GraphConfig,
    client: GraphClient,
    domain: Domain,
}

impl DirectoryContext {
    /// Authenticates and resolves the directory's first registered domain.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, the token cannot be acquired,
    /// the domain listing fails or the directory has no domains. A failed
    /// connection cannot be retried from here; build a new one.
    #[instrument(skip(config), fields(tenant_id = %config.tenant_id))]
    pub async fn connect(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        let client = GraphClient::new(&config)?;
        client.token_cache().get_token().await?;

        let domains: ODataPage<Domain> = client.get(&client.url("domains")).await?;
        let domain = domains
            .value
            .into_iter()
            .next()
            .ok_or(GraphError::NoDomains)?;

        info!(domain = %domain.id, "Connected to directory");

        Ok(Self {
            config,
            client,
            domain,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    /// The domain used to build principal names.
    #[must_use]
    pub fn default_domain(&self) -> &Domain {
        &self.domain
    }

    /// Fetches every item of a collection, following continuation links.
    pub(crate) async fn list_all<T>(&self, path: &str) -> GraphResult<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let first: ODataPage<T> = self.client.get(&self.client.url(path)).await?;
        PageIterator::new(&self.client, first).collect_all().await
    }

    /// Runs a mutation with the configured retry budget, logging each failed attempt.
    pub(crate) async fn retry<T, F, Fut>(&self, action: &str, operation: F) -> GraphResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GraphResult<T>>,
    {
        let max_attempts = self.config.retry_count;
        retry_with_observer(
            max_attempts,
            self.config.retry_delay_ms,
            |error: &GraphError, attempt| {
                warn!(
                    "{} failed (attempt {}/{}): {}",
                    action, attempt, max_attempts, error
                );
            },
            operation,
        )
        .await
    }
}
