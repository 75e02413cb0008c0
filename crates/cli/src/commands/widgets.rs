//! Widget inspection commands.
//!
//! # Usage
//!
//! ```bash
//! bw-cli widgets list --shop my-shop.myshopify.com
//! bw-cli widgets show 12
//! ```

use bundlewise_admin::db::WidgetRepository;
use bundlewise_core::{ShopDomain, WidgetId};

use super::{CommandError, connect, print_json};

/// Print the widgets of a shop.
pub async fn list(shop: &str) -> Result<(), CommandError> {
    let shop = ShopDomain::parse(shop)?;
    let pool = connect().await?;

    let widgets = WidgetRepository::new(&pool).list(&shop).await?;
    tracing::info!(shop = %shop, count = widgets.len(), "Loaded widgets");
    print_json(&widgets)
}

/// Print one widget with its products and settings.
pub async fn show(id: WidgetId) -> Result<(), CommandError> {
    let pool = connect().await?;

    let widget = WidgetRepository::new(&pool)
        .get_any(id)
        .await?
        .ok_or(CommandError::WidgetNotFound(id))?;
    print_json(&widget)
}
