//! Domain types for Shopify Admin API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! GraphQL response shapes in `admin::queries`.

pub mod bulk;
pub mod common;
pub mod inventory;
pub mod market;
pub mod product;

// Re-export all types for convenience
pub use bulk::*;
pub use common::*;
pub use inventory::*;
pub use market::*;
pub use product::*;
