//! Authenticated access to the Microsoft Graph REST API

pub mod auth;
pub mod client;

pub use auth::TokenCache;
pub use client::GraphClient;
