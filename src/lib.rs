//! b2c-graph - manage users and groups in an Azure AD B2C directory through
//! Microsoft Graph.
//!
//! # Architecture
//!
//! - [`core`] holds the configuration value, the wire models and the retry
//!   and page-iteration helpers
//! - [`graph`] acquires client-credentials tokens and talks HTTP to Graph
//! - [`repo`] exposes the user and group operations; each repository owns (or
//!   shares) a [`repo::DirectoryContext`] that authenticates once and caches
//!   the directory's first domain
//!
//! Mutating user calls are retried up to `retry_count` times. Reads fail on the
//! first error.
//!
//! # Example
//!
//! ```no_run
//! use b2c_graph::{GraphConfig, UserRepo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), b2c_graph::GraphError> {
//!     b2c_graph::setup_logging();
//!
//!     let config = GraphConfig::from_env()?;
//!     let users = UserRepo::new(config).await?;
//!
//!     if !users.exists("fred.flintstone@contoso.onmicrosoft.com").await? {
//!         let fred = users
//!             .add_user_with_name("fred", "flintstone", "Fred Flintstone", "my pretty good password!01")
//!             .await?;
//!         println!("created {:?}", fred.id);
//!     }
//!
//!     Ok(())
//! }
//! ```
pub mod core;
pub mod errors;
pub mod graph;
pub mod repo;

pub use crate::core::config::{GraphCloud, GraphConfig};
pub use crate::core::models::{DirectoryObject, Domain, Group, PasswordProfile, User};
pub use errors::{GraphError, GraphResult};
pub use repo::{DirectoryContext, GroupsRepo, UserRepo};

/// Configure structured JSON logging.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first subscriber is installed.
///
/// # Example
///
/// ```
/// b2c_graph::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
