//! Bulk operations: order export for widget analytics.
//!
//! `bulkOperationRunQuery` starts an asynchronous export; the operation is
//! polled until it reaches a terminal status, then its JSONL result is
//! downloaded. Nested connections are flattened by Shopify: every line item
//! is its own line pointing at its order through `__parentId`.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use bundlewise_core::{Gid, ResourceKind};

use super::{
    AdminClient, AdminShopifyError,
    conversions::{enum_name, gid},
    missing_payload,
    queries::{
        BulkOperationRunQuery, GetBulkOperation, bulk_operation_run_query,
        get_bulk_operation::{self, GetBulkOperationNode},
    },
};
use crate::config::BulkPollConfig;
use crate::shopify::types::{
    BulkLineItem, BulkOperation, BulkOperationStatus, BulkOrder, UserError,
};
use crate::shopify::user_errors;

impl AdminClient {
    /// Start a bulk query.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserError` if Shopify refuses the operation
    /// (e.g. another bulk query is already running for the shop).
    #[instrument(skip(self, query), fields(shop = %self.shop()))]
    pub async fn run_bulk_query(&self, query: &str) -> Result<Gid, AdminShopifyError> {
        let variables = bulk_operation_run_query::Variables {
            query: query.to_string(),
        };

        let response = self.execute::<BulkOperationRunQuery>(variables).await?;
        let payload = response
            .bulk_operation_run_query
            .ok_or_else(|| missing_payload("bulkOperationRunQuery"))?;

        let errors: Vec<UserError> = payload
            .user_errors
            .into_iter()
            .map(|e| UserError {
                field: e.field,
                message: e.message,
            })
            .collect();
        if let Some(err) = user_errors(&errors) {
            return Err(err);
        }

        let operation = payload
            .bulk_operation
            .ok_or_else(|| missing_payload("bulkOperationRunQuery"))?;
        let id = gid(&operation.id)?;
        tracing::info!(id = %id, status = ?operation.status, "Bulk operation started");
        Ok(id)
    }

    /// Current state of a bulk operation.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::NotFound` if the ID is not a bulk operation.
    #[instrument(skip(self), fields(shop = %self.shop(), id = %id))]
    pub async fn get_bulk_operation(&self, id: &Gid) -> Result<BulkOperation, AdminShopifyError> {
        let variables = get_bulk_operation::Variables { id: id.to_string() };

        let response = self.execute::<GetBulkOperation>(variables).await?;

        match response.node {
            Some(GetBulkOperationNode::BulkOperation(op)) => Ok(BulkOperation {
                id: gid(&op.id)?,
                status: bulk_status(&op.status),
                error_code: op.error_code.as_ref().map(enum_name),
                object_count: op.object_count.parse().unwrap_or_default(),
                url: op.url,
            }),
            _ => Err(AdminShopifyError::NotFound(format!("Bulk operation {id}"))),
        }
    }

    /// Poll a bulk operation until it completes.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::BulkOperationFailed` if it ends in any
    /// status other than `COMPLETED`, and `BulkOperationTimeout` if
    /// `poll.timeout` elapses first.
    pub async fn wait_for_bulk_operation(
        &self,
        id: &Gid,
        poll: &BulkPollConfig,
    ) -> Result<BulkOperation, AdminShopifyError> {
        poll_until_complete(*id, poll, || self.get_bulk_operation(id)).await
    }

    /// Download the JSONL result of a completed operation.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::Http` if the download fails.
    #[instrument(skip(self, url), fields(shop = %self.shop()))]
    pub async fn download_bulk_result(&self, url: &str) -> Result<String, AdminShopifyError> {
        let response = self.http().get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Export orders (with line items) created on or after `since`.
    ///
    /// An operation that matched nothing has no result URL and yields an
    /// empty export.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation cannot be started, fails, times out,
    /// or its result cannot be downloaded or parsed.
    #[instrument(skip(self, poll), fields(shop = %self.shop()))]
    pub async fn export_orders(
        &self,
        since: Option<NaiveDate>,
        poll: &BulkPollConfig,
    ) -> Result<Vec<BulkOrder>, AdminShopifyError> {
        let id = self.run_bulk_query(&orders_bulk_query(since)).await?;
        let operation = self.wait_for_bulk_operation(&id, poll).await?;

        let Some(url) = operation.url else {
            tracing::info!(id = %id, "Bulk operation returned no data");
            return Ok(Vec::new());
        };

        let body = self.download_bulk_result(&url).await?;
        let orders = parse_bulk_orders(&body)?;
        tracing::info!(id = %id, orders = orders.len(), "Bulk order export complete");
        Ok(orders)
    }
}

/// Map the generated status onto the domain one.
///
/// A status this build does not know keeps the operation polling until it
/// settles or times out.
fn bulk_status(status: &get_bulk_operation::BulkOperationStatus) -> BulkOperationStatus {
    use get_bulk_operation::BulkOperationStatus as Status;

    match status {
        Status::CREATED => BulkOperationStatus::Created,
        Status::RUNNING | Status::Other(_) => BulkOperationStatus::Running,
        Status::COMPLETED => BulkOperationStatus::Completed,
        Status::CANCELING => BulkOperationStatus::Canceling,
        Status::CANCELED => BulkOperationStatus::Canceled,
        Status::FAILED => BulkOperationStatus::Failed,
        Status::EXPIRED => BulkOperationStatus::Expired,
    }
}

/// Bulk query selecting orders and the line item fields analytics needs.
#[must_use]
pub fn orders_bulk_query(since: Option<NaiveDate>) -> String {
    let filter = since.map_or_else(String::new, |date| {
        format!("(query: \"created_at:>={}\")", date.format("%Y-%m-%d"))
    });
    format!(
        r"{{
  orders{filter} {{
    edges {{
      node {{
        id
        name
        createdAt
        currencyCode
        lineItems {{
          edges {{
            node {{
              id
              quantity
              variant {{ id }}
              product {{ id }}
              discountedUnitPriceSet {{ shopMoney {{ amount currencyCode }} }}
              customAttributes {{ key value }}
            }}
          }}
        }}
      }}
    }}
  }}
}}"
    )
}

/// Poll `fetch` every `poll.interval` until the operation is terminal.
async fn poll_until_complete<F, Fut>(
    id: Gid,
    poll: &BulkPollConfig,
    mut fetch: F,
) -> Result<BulkOperation, AdminShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<BulkOperation, AdminShopifyError>>,
{
    let polling = async {
        loop {
            let operation = fetch().await?;
            match operation.status {
                BulkOperationStatus::Completed => return Ok(operation),
                status if status.is_terminal() => {
                    return Err(AdminShopifyError::BulkOperationFailed {
                        id,
                        status,
                        error_code: operation.error_code,
                    });
                }
                status => {
                    tracing::debug!(id = %id, %status, objects = operation.object_count, "Bulk operation in progress");
                    tokio::time::sleep(poll.interval).await;
                }
            }
        }
    };

    tokio::time::timeout(poll.timeout, polling)
        .await
        .map_err(|_| AdminShopifyError::BulkOperationTimeout(id))?
}

// =============================================================================
// JSONL parsing
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkLine {
    id: Gid,
    #[serde(rename = "__parentId")]
    parent_id: Option<Gid>,
    name: Option<String>,
    created_at: Option<DateTime<Utc>>,
    currency_code: Option<String>,
    quantity: Option<i64>,
    variant: Option<IdRef>,
    product: Option<IdRef>,
    discounted_unit_price_set: Option<MoneyBag>,
    #[serde(default)]
    custom_attributes: Vec<Attribute>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: Gid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyBag {
    shop_money: MoneyAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyAmount {
    amount: Decimal,
    currency_code: String,
}

#[derive(Debug, Deserialize)]
struct Attribute {
    key: String,
    value: Option<String>,
}

/// Reassemble orders from a bulk export.
///
/// Parents always precede their children in Shopify's output, so a child
/// whose parent has not been seen is rejected. Children of other kinds are
/// ignored.
///
/// # Errors
///
/// Returns `AdminShopifyError::Jsonl` with the 1-based line number of the
/// first malformed or orphaned line.
pub fn parse_bulk_orders(jsonl: &str) -> Result<Vec<BulkOrder>, AdminShopifyError> {
    let mut orders: Vec<BulkOrder> = Vec::new();
    let mut index: HashMap<Gid, usize> = HashMap::new();

    for (number, raw) in jsonl.lines().enumerate() {
        let line_number = number + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let line: BulkLine = serde_json::from_str(raw).map_err(|e| AdminShopifyError::Jsonl {
            line: line_number,
            message: e.to_string(),
        })?;

        match (line.id.kind(), line.parent_id) {
            (ResourceKind::Order, None) => {
                index.insert(line.id, orders.len());
                orders.push(BulkOrder {
                    id: line.id,
                    name: line.name,
                    created_at: line.created_at,
                    currency_code: line.currency_code,
                    line_items: Vec::new(),
                });
            }
            (ResourceKind::LineItem, Some(parent)) => {
                let order = index
                    .get(&parent)
                    .and_then(|&i| orders.get_mut(i))
                    .ok_or_else(|| AdminShopifyError::Jsonl {
                        line: line_number,
                        message: format!("parent {parent} not seen before line item {}", line.id),
                    })?;

                let (discounted_unit_price, currency_code) = line
                    .discounted_unit_price_set
                    .map_or((None, None), |m| {
                        (Some(m.shop_money.amount), Some(m.shop_money.currency_code))
                    });

                order.line_items.push(BulkLineItem {
                    id: line.id,
                    quantity: line.quantity.unwrap_or_default(),
                    variant_id: line.variant.map(|v| v.id),
                    product_id: line.product.map(|p| p.id),
                    discounted_unit_price,
                    currency_code,
                    custom_attributes: line
                        .custom_attributes
                        .into_iter()
                        .filter_map(|a| a.value.map(|v| (a.key, v)))
                        .collect(),
                });
            }
            _ => {}
        }
    }

    Ok(orders)
}
