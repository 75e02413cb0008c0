//! Core types for Bundlewise.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod gid;
pub mod id;
pub mod shop;
pub mod widget;

pub use gid::{Gid, GidError, ResourceKind};
pub use id::*;
pub use shop::{ShopDomain, ShopDomainError};
pub use widget::{WidgetEventType, WidgetType, WidgetTypeError};
