//! Bulk operation state and the order export it produces.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bundlewise_core::Gid;

/// Status of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkOperationStatus {
    Created,
    Running,
    Completed,
    Canceling,
    Canceled,
    Failed,
    Expired,
}

impl BulkOperationStatus {
    /// Whether Shopify will make no further progress on the operation.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Failed | Self::Expired
        )
    }
}

impl std::fmt::Display for BulkOperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Canceling => "CANCELING",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Snapshot of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperation {
    pub id: Gid,
    pub status: BulkOperationStatus,
    pub error_code: Option<String>,
    pub object_count: u64,
    /// JSONL download URL. `None` when the operation matched nothing.
    pub url: Option<String>,
}

/// An order reassembled from a bulk export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrder {
    pub id: Gid,
    pub name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub currency_code: Option<String>,
    pub line_items: Vec<BulkLineItem>,
}

/// A line item of an exported order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLineItem {
    pub id: Gid,
    pub quantity: i64,
    pub variant_id: Option<Gid>,
    pub product_id: Option<Gid>,
    pub discounted_unit_price: Option<Decimal>,
    pub currency_code: Option<String>,
    pub custom_attributes: Vec<(String, String)>,
}

impl BulkLineItem {
    /// Value of a custom attribute (line item property).
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.custom_attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
