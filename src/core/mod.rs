//! Configuration, wire models and the retry/page-iteration helpers

pub mod config;
pub mod models;
pub mod pagination;
pub mod retry;

pub use config::{GraphCloud, GraphConfig};
pub use models::{DirectoryObject, Domain, Group, PasswordProfile, User};
