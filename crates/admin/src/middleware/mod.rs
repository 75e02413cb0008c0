//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (public API only)
//! 5. Rate limiting (public API and install flow)
//!
//! Authentication is per handler through extractors:
//! [`RequireShopSession`] for the embedded admin, [`ShopifyWebhook`] for webhooks.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod webhook;

pub use auth::RequireShopSession;
pub use rate_limit::{auth_rate_limiter, public_api_rate_limiter};
pub use request_id::request_id_middleware;
pub use webhook::ShopifyWebhook;
