use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use crate::errors::{GraphError, GraphResult};

pub const DEFAULT_RETRY_COUNT: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;

/// Conventional name of the configuration section holding the directory settings.
pub const SECTION_NAME: &str = "GraphUtilConfig";

/// Identity platform and Graph hosts for a national cloud.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphCloud {
    #[default]
    Global,
    UsGovernment,
    China,
    Custom {
        login_endpoint: String,
        graph_endpoint: String,
    },
}

impl GraphCloud {
    #[must_use]
    pub fn login_endpoint(&self) -> &str {
        match self {
            GraphCloud::Global => "https://login.microsoftonline.com",
            GraphCloud::UsGovernment => "https://login.microsoftonline.us",
            GraphCloud::China => "https://login.chinacloudapi.cn",
            GraphCloud::Custom { login_endpoint, .. } => login_endpoint.trim_end_matches('/'),
        }
    }

    #[must_use]
    pub fn graph_endpoint(&self) -> &str {
        match self {
            GraphCloud::Global => "https://graph.microsoft.com",
            GraphCloud::UsGovernment => "https://graph.microsoft.us",
            GraphCloud::China => "https://microsoftgraph.chinacloudapi.cn",
            GraphCloud::Custom { graph_endpoint, .. } => graph_endpoint.trim_end_matches('/'),
        }
    }
}

/// Settings for one B2C directory.
///
/// The application registration needs admin-consented `User.ReadWrite.All`,
/// `Group.ReadWrite.All`, `Directory.ReadWrite.All` and `People.Read.All`.
#[derive(Clone)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub app_id: String,
    pub secret: String,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub cloud: GraphCloud,
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("tenant_id", &self.tenant_id)
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .field("retry_count", &self.retry_count)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("cloud", &self.cloud)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigSection {
    app_id: String,
    tenant_id: String,
    secret: String,
    retry_count: Option<u32>,
}

impl GraphConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        app_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            app_id: app_id.into(),
            secret: secret.into(),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            cloud: GraphCloud::default(),
        }
    }

    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    #[must_use]
    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    #[must_use]
    pub fn with_cloud(mut self, cloud: GraphCloud) -> Self {
        self.cloud = cloud;
        self
    }

    /// Reads `B2C_GRAPH_TENANT_ID`, `B2C_GRAPH_APP_ID`, `B2C_GRAPH_SECRET` and
    /// the optional `B2C_GRAPH_RETRY_COUNT` / `B2C_GRAPH_RETRY_DELAY_MS`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable that is unset or cannot be parsed.
    pub fn from_env() -> GraphResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`GraphConfig::from_env`], with variables resolved by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable that is unset or cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GraphResult<Self> {
        let config = Self::new(
            required_var(&lookup, "B2C_GRAPH_TENANT_ID")?,
            required_var(&lookup, "B2C_GRAPH_APP_ID")?,
            required_var(&lookup, "B2C_GRAPH_SECRET")?,
        )
        .with_retry_count(parsed_var(&lookup, "B2C_GRAPH_RETRY_COUNT", DEFAULT_RETRY_COUNT)?)
        .with_retry_delay_ms(parsed_var(
            &lookup,
            "B2C_GRAPH_RETRY_DELAY_MS",
            DEFAULT_RETRY_DELAY_MS,
        )?);

        config.validate()?;
        Ok(config)
    }

    /// Reads the settings from a named section of a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is missing or malformed.
    pub fn from_section(document: &serde_json::Value, section: &str) -> GraphResult<Self> {
        let value = document
            .get(section)
            .ok_or_else(|| GraphError::Config(format!("missing section {section}")))?;
        let parsed: ConfigSection = serde_json::from_value(value.clone())
            .map_err(|e| GraphError::Config(format!("section {section}: {e}")))?;

        let config = Self::new(parsed.tenant_id, parsed.app_id, parsed.secret)
            .with_retry_count(parsed.retry_count.unwrap_or(DEFAULT_RETRY_COUNT));
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first empty required field.
    pub fn validate(&self) -> GraphResult<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(GraphError::Config("tenant id is required".into()));
        }
        if self.app_id.trim().is_empty() {
            return Err(GraphError::Config("application id is required".into()));
        }
        if self.secret.is_empty() {
            return Err(GraphError::Config("client secret is required".into()));
        }
        Ok(())
    }
}

fn required_var(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> GraphResult<String> {
    lookup(name).ok_or_else(|| GraphError::Config(format!("{name} is not set")))
}

fn parsed_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> GraphResult<T>
where
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| GraphError::Config(format!("{name}: {e}"))),
        None => Ok(default),
    }
}
