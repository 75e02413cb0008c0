//! Common domain types shared across Shopify Admin API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Cursor pagination state of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

// =============================================================================
// Mutation Errors
// =============================================================================

/// A `userErrors` entry returned by a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) if !field.is_empty() => write!(f, "{}: {}", field.join("."), self.message),
            _ => f.write_str(&self.message),
        }
    }
}
