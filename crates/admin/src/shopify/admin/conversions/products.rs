//! Product type conversion functions.

use crate::shopify::AdminShopifyError;
use crate::shopify::types::{
    PageInfo, PickerProduct, PickerProductConnection, PickerVariant, ProductStatus,
};

use super::super::queries::search_products::{
    self, SearchProductsProducts, SearchProductsProductsNodes,
    SearchProductsProductsNodesVariantsNodes,
};
use super::gid;

pub fn convert_product_connection(
    products: SearchProductsProducts,
) -> Result<PickerProductConnection, AdminShopifyError> {
    Ok(PickerProductConnection {
        products: products
            .nodes
            .into_iter()
            .map(convert_product)
            .collect::<Result<_, _>>()?,
        page_info: PageInfo {
            has_next_page: products.page_info.has_next_page,
            end_cursor: products.page_info.end_cursor,
        },
    })
}

fn convert_product(product: SearchProductsProductsNodes) -> Result<PickerProduct, AdminShopifyError> {
    let (image_url, image_alt) = product
        .featured_image
        .map_or((None, None), |i| (Some(i.url), i.alt_text));

    Ok(PickerProduct {
        id: gid(&product.id)?,
        title: product.title,
        handle: product.handle,
        status: convert_status(&product.status),
        image_url,
        image_alt,
        variants: product
            .variants
            .nodes
            .into_iter()
            .map(convert_variant)
            .collect::<Result<_, _>>()?,
    })
}

fn convert_variant(
    variant: SearchProductsProductsNodesVariantsNodes,
) -> Result<PickerVariant, AdminShopifyError> {
    Ok(PickerVariant {
        id: gid(&variant.id)?,
        title: variant.title,
        sku: variant.sku.filter(|s| !s.is_empty()),
        price: variant.price,
        compare_at_price: variant.compare_at_price,
        available_for_sale: variant.available_for_sale,
    })
}

fn convert_status(status: &search_products::ProductStatus) -> ProductStatus {
    match status {
        search_products::ProductStatus::ACTIVE => ProductStatus::Active,
        search_products::ProductStatus::ARCHIVED => ProductStatus::Archived,
        search_products::ProductStatus::UNLISTED => ProductStatus::Unlisted,
        search_products::ProductStatus::DRAFT | search_products::ProductStatus::Other(_) => {
            ProductStatus::Draft
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_convert_product_connection() {
        let products: SearchProductsProducts = serde_json::from_value(json!({
            "nodes": [{
                "id": "gid://shopify/Product/1",
                "title": "Tee",
                "handle": "tee",
                "status": "ACTIVE",
                "featuredImage": { "url": "https://cdn.example/tee.png", "altText": null },
                "variants": { "nodes": [{
                    "id": "gid://shopify/ProductVariant/2",
                    "title": "Default Title",
                    "sku": "",
                    "price": "20.00",
                    "compareAtPrice": "25.00",
                    "availableForSale": true
                }]}
            }],
            "pageInfo": { "hasNextPage": true, "endCursor": "abc" }
        }))
        .unwrap();

        let page = convert_product_connection(products).unwrap();
        assert!(page.page_info.has_next_page);
        assert_eq!(page.page_info.end_cursor.as_deref(), Some("abc"));

        let product = page.products.first().unwrap();
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.example/tee.png"));
        let variant = product.variants.first().unwrap();
        assert_eq!(variant.sku, None);
        assert_eq!(variant.compare_at_price, Some("25.00".parse().unwrap()));
    }

    #[test]
    fn test_unknown_status_is_draft() {
        let status: search_products::ProductStatus =
            serde_json::from_value(json!("SOMETHING_NEW")).unwrap();
        assert_eq!(convert_status(&status), ProductStatus::Draft);
    }
}
