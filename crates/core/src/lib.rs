//! Bundlewise Core - Shared domain library.
//!
//! This crate provides the types and pure logic shared by all Bundlewise components:
//! - `admin` - Embedded admin server, public widget API, and webhooks
//! - `cart-transform` - Shopify Cart Transform Function
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Discount tier resolution lives here so the server
//! and the checkout function always agree on the percent for a given selection.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, shop domains, Shopify GIDs, widget types
//! - [`discount`] - Tiered discount resolution
//! - [`settings`] - Persisted widget settings JSON
//! - [`cart_transform`] - Cart Transform Function input, output, and `run`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart_transform;
pub mod discount;
pub mod settings;
pub mod types;

pub use discount::{DiscountTier, DiscountTiers, TierError, apply_percent, final_discount};
pub use settings::{AppearanceText, SettingsError, WidgetSettings};
pub use types::*;
