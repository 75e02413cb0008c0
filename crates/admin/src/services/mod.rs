//! Business logic services for the app server.
//!
//! # Services
//!
//! - `widgets` - Validation of submitted widget blobs
//! - `discounts` - Bundle discount quotes for the storefront
//! - `variant_sync` - Read-through variant cache and webhook updates
//! - `order_analytics` - Bulk order export aggregation per widget
//! - `function_config` - Cart transform metafield sync

pub mod discounts;
pub mod function_config;
pub mod order_analytics;
pub mod variant_sync;
pub mod widgets;

pub use function_config::ShopLocks;
pub use discounts::{DiscountQuote, DiscountRequest, PricedLine, quote};
pub use variant_sync::{SyncOutcome, load_snapshots};
pub use widgets::{WidgetValidationError, validate};
