//! # Stock Commands
//!
//! Inventory goes through the stock ledger: adjustments are single
//! conditional updates, so concurrent sellers can never drive a quantity
//! below zero.

use emporium_core::{StockEntry, StockStatus};
use tracing::info;

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::ApiResult;

/// Adds `delta` (negative to remove) to a product's quantity.
///
/// ## Returns
/// The new stock status, or 409 when the result would be negative.
pub async fn adjust_stock(
    ctx: &AppContext,
    who: &Identity,
    product_id: &str,
    delta: i64,
) -> ApiResult<StockStatus> {
    let quantity = ctx.ledger.adjust_quantity(product_id, delta).await?;
    info!(product_id = %product_id, delta, quantity, user = %who.username(), "Stock adjusted");
    Ok(StockStatus::from_quantity(quantity))
}

/// Sets an absolute quantity. Negative values are a 400.
pub async fn set_stock(
    ctx: &AppContext,
    who: &Identity,
    product_id: &str,
    quantity: i64,
) -> ApiResult<StockStatus> {
    let quantity = ctx.ledger.set_quantity(product_id, quantity).await?;
    info!(product_id = %product_id, quantity, user = %who.username(), "Stock set");
    Ok(StockStatus::from_quantity(quantity))
}

pub async fn stock_status(
    ctx: &AppContext,
    _who: &Identity,
    product_id: &str,
) -> ApiResult<StockStatus> {
    Ok(ctx.ledger.status(product_id).await?)
}

/// Every product with its quantity and category name.
pub async fn stock_report(ctx: &AppContext, _who: &Identity) -> ApiResult<Vec<StockEntry>> {
    Ok(ctx.ledger.report().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::create_product;
    use crate::commands::test_support::context;
    use crate::error::ErrorCode;
    use emporium_core::ProductDraft;

    #[tokio::test]
    async fn test_sell_out_then_refuse() {
        let (ctx, who, _dir) = context().await;
        let product = create_product(
            &ctx,
            &who,
            ProductDraft {
                name: "Sabão em pó".into(),
                price_cents: 1250,
                quantity: 3,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        let status = adjust_stock(&ctx, &who, &product.id, -3).await.unwrap();
        assert_eq!(status.quantity, 0);
        assert!(!status.in_stock);

        let err = adjust_stock(&ctx, &who, &product.id, -1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(stock_status(&ctx, &who, &product.id).await.unwrap().quantity, 0);

        let err = set_stock(&ctx, &who, &product.id, -1).await.unwrap_err();
        assert_eq!(err.http_status(), 400);

        let status = set_stock(&ctx, &who, &product.id, 12).await.unwrap();
        assert!(status.in_stock);

        let report = stock_report(&ctx, &who).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].quantity, 12);
        assert_eq!(report[0].category_name, emporium_core::UNCATEGORIZED);
    }

    #[tokio::test]
    async fn test_unknown_product_is_404() {
        let (ctx, who, _dir) = context().await;
        let err = adjust_stock(&ctx, &who, "missing", 1).await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }
}
