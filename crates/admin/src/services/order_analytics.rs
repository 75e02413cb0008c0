//! Bundle order statistics.
//!
//! Storefront widgets tag every line they add with `_bundle_widget_id`; the
//! orders bulk export is grouped by that attribute and joined with the
//! widget event counts.

use std::collections::{HashMap, HashSet};

use rust_decimal::{Decimal, RoundingStrategy};

use bundlewise_core::WidgetId;
use bundlewise_core::cart_transform::WIDGET_ID_ATTRIBUTE;

use crate::models::{WidgetAnalytics, WidgetEventCounts, WidgetOrderStats};
use crate::shopify::BulkOrder;

/// Group exported orders by the widget that added their lines.
///
/// An order counts once per widget however many of its lines the widget
/// added. Lines with a missing or non-numeric widget attribute are ignored.
#[must_use]
pub fn aggregate_orders(orders: &[BulkOrder]) -> HashMap<WidgetId, WidgetOrderStats> {
    let mut stats: HashMap<WidgetId, WidgetOrderStats> = HashMap::new();

    for order in orders {
        let mut counted = HashSet::new();
        for item in &order.line_items {
            let Some(widget_id) = item
                .attribute(WIDGET_ID_ATTRIBUTE)
                .and_then(|raw| raw.trim().parse::<WidgetId>().ok())
            else {
                continue;
            };
            let entry = stats
                .entry(widget_id)
                .or_insert_with(|| WidgetOrderStats::empty(widget_id));

            if counted.insert(widget_id) {
                entry.orders += 1;
            }
            let quantity = u64::try_from(item.quantity).unwrap_or_default();
            entry.items += quantity;
            if let Some(price) = item.discounted_unit_price {
                entry.revenue += price * Decimal::from(quantity);
            }
            if entry.currency_code.is_none() {
                entry.currency_code = item
                    .currency_code
                    .clone()
                    .or_else(|| order.currency_code.clone());
            }
        }
    }

    stats
}

/// Join event counts with order statistics into admin analytics rows.
///
/// Every widget with event counts gets a row; order stats for widgets that
/// no longer exist are dropped.
#[must_use]
pub fn combine(
    events: Vec<WidgetEventCounts>,
    orders: &HashMap<WidgetId, WidgetOrderStats>,
) -> Vec<WidgetAnalytics> {
    events
        .into_iter()
        .map(|events| {
            let stats = orders
                .get(&events.widget_id)
                .cloned()
                .unwrap_or_else(|| WidgetOrderStats::empty(events.widget_id));
            WidgetAnalytics {
                click_through_rate: ratio(
                    u64::try_from(events.clicks).unwrap_or_default(),
                    u64::try_from(events.impressions).unwrap_or_default(),
                ),
                conversion_rate: ratio(stats.orders, u64::try_from(events.clicks).unwrap_or_default()),
                events,
                orders: stats.orders,
                items: stats.items,
                revenue: stats.revenue,
                currency_code: stats.currency_code,
            }
        })
        .collect()
}

fn ratio(numerator: u64, denominator: u64) -> Option<Decimal> {
    if denominator == 0 {
        return None;
    }
    Some(
        (Decimal::from(numerator) / Decimal::from(denominator))
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
    )
}
