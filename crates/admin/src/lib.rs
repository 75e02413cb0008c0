//! Bundlewise app server library.
//!
//! The embedded admin API, the storefront widget API, Shopify webhooks, and
//! the OAuth install flow, exposed as a library so the binary, the CLI, and
//! the integration tests share one router and one set of repositories.
//!
//! # Security
//!
//! The server holds every installed shop's offline Admin API token. Admin
//! routes require an App Bridge session token; webhooks and the OAuth
//! callback are HMAC verified with the app secret.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

pub use app::create_app;
pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;
