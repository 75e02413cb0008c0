use shopify_function::prelude::*;
use shopify_function::Result;

use bundlewise_core::cart_transform::{self, BundleLine, FunctionConfig, PriceUpdate};

use super::schema;

#[shopify_function]
fn cart_transform_run(input: schema::run::RunInput) -> Result<schema::CartTransformRunResult> {
    let config = FunctionConfig::from_metafield(
        input
            .cart_transform()
            .metafield()
            .map(|metafield| metafield.value().as_str()),
    );

    let lines: Vec<BundleLine> = input
        .cart()
        .lines()
        .iter()
        .map(|line| BundleLine {
            id: line.id().to_string(),
            amount_per_quantity: to_amount(line.cost().amount_per_quantity().amount().0),
            bundle_id: line.bundle_id().and_then(|a| a.value()).map(ToString::to_string),
            widget_id: line.widget_id().and_then(|a| a.value()).map(ToString::to_string),
            discount: line.discount().and_then(|a| a.value()).map(ToString::to_string),
        })
        .collect();

    let operations = cart_transform::run(&lines, &config)
        .into_iter()
        .map(line_update)
        .collect();

    Ok(schema::CartTransformRunResult { operations })
}

fn line_update(update: PriceUpdate) -> schema::Operation {
    schema::Operation::LineUpdate(schema::LineUpdateOperation {
        cart_line_id: update.cart_line_id,
        image: None,
        price: Some(schema::LineUpdateOperationPriceAdjustment {
            adjustment: schema::LineUpdateOperationPriceAdjustmentValue::FixedPricePerUnit(
                schema::LineUpdateOperationFixedPricePerUnitAdjustment {
                    amount: Decimal(to_float(update.amount)),
                },
            ),
        }),
        title: None,
    })
}

/// Converts through the shortest decimal form of the `f64`.
fn to_amount(value: f64) -> rust_decimal::Decimal {
    value.to_string().parse().unwrap_or_default()
}

fn to_float(amount: rust_decimal::Decimal) -> f64 {
    amount.to_string().parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopify_function::{run_function_with_input, Result};

    fn fixed_price(cart_line_id: &str, amount: f64) -> schema::Operation {
        schema::Operation::LineUpdate(schema::LineUpdateOperation {
            cart_line_id: cart_line_id.to_string(),
            image: None,
            price: Some(schema::LineUpdateOperationPriceAdjustment {
                adjustment: schema::LineUpdateOperationPriceAdjustmentValue::FixedPricePerUnit(
                    schema::LineUpdateOperationFixedPricePerUnitAdjustment {
                        amount: Decimal(amount),
                    },
                ),
            }),
            title: None,
        })
    }

    #[test]
    fn test_config_tiers_price_bundle_lines() -> Result<()> {
        let result = run_function_with_input(
            cart_transform_run,
            r#"
                {
                    "cart": {
                        "lines": [
                            {
                                "id": "gid://shopify/CartLine/1",
                                "bundleId": { "value": "bundle-abc" },
                                "widgetId": { "value": "12" },
                                "discount": { "value": "99" },
                                "cost": { "amountPerQuantity": { "amount": "40.0" } }
                            },
                            {
                                "id": "gid://shopify/CartLine/2",
                                "bundleId": { "value": "bundle-abc" },
                                "widgetId": { "value": "12" },
                                "discount": { "value": "99" },
                                "cost": { "amountPerQuantity": { "amount": "15.5" } }
                            },
                            {
                                "id": "gid://shopify/CartLine/3",
                                "bundleId": null,
                                "widgetId": null,
                                "discount": null,
                                "cost": { "amountPerQuantity": { "amount": "3.00" } }
                            }
                        ]
                    },
                    "cartTransform": {
                        "metafield": { "value": "{\"widgets\":{\"12\":[{\"2\":10},{\"3\":20}]}}" }
                    }
                }
            "#,
        )?;

        let expected = schema::CartTransformRunResult {
            operations: vec![
                fixed_price("gid://shopify/CartLine/1", 36.0),
                fixed_price("gid://shopify/CartLine/2", 13.95),
            ],
        };
        assert_eq!(result, expected);
        Ok(())
    }

    #[test]
    fn test_attribute_percent_without_config() -> Result<()> {
        let result = run_function_with_input(
            cart_transform_run,
            r#"
                {
                    "cart": {
                        "lines": [
                            {
                                "id": "gid://shopify/CartLine/1",
                                "bundleId": { "value": "b1" },
                                "widgetId": { "value": "7" },
                                "discount": { "value": "10" },
                                "cost": { "amountPerQuantity": { "amount": "9.99" } }
                            }
                        ]
                    },
                    "cartTransform": { "metafield": null }
                }
            "#,
        )?;

        let expected = schema::CartTransformRunResult {
            operations: vec![fixed_price("gid://shopify/CartLine/1", 8.99)],
        };
        assert_eq!(result, expected);
        Ok(())
    }

    #[test]
    fn test_cart_without_bundles_is_unchanged() -> Result<()> {
        let result = run_function_with_input(
            cart_transform_run,
            r#"
                {
                    "cart": {
                        "lines": [
                            {
                                "id": "gid://shopify/CartLine/1",
                                "bundleId": null,
                                "widgetId": null,
                                "discount": null,
                                "cost": { "amountPerQuantity": { "amount": "12.00" } }
                            }
                        ]
                    },
                    "cartTransform": { "metafield": { "value": "not json" } }
                }
            "#,
        )?;

        assert_eq!(result, schema::CartTransformRunResult { operations: vec![] });
        Ok(())
    }

    #[test]
    fn test_amount_conversion_keeps_cents() {
        assert_eq!(to_amount(15.5).to_string(), "15.5");
        assert_eq!(to_amount(9.99).to_string(), "9.99");
        assert!((to_float("13.95".parse().unwrap_or_default()) - 13.95).abs() < f64::EPSILON);
    }
}
