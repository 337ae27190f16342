//! # Sale Commands
//!
//! Sales and their line items. Creating or removing lines does not touch
//! stock and does not recompute the sale total; [`sales_report`] shows
//! where the recorded total and the lines disagree.

use emporium_core::{
    Sale, SaleDraft, SaleFilter, SaleItem, SaleItemDraft, SaleItemFilter, SaleItemPatch, SalePatch,
};
use emporium_db::SaleSummary;
use serde::Serialize;

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::ApiResult;

/// A sale with its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

pub async fn list_sales(
    ctx: &AppContext,
    _who: &Identity,
    filter: &SaleFilter,
) -> ApiResult<Vec<Sale>> {
    super::list(ctx, filter).await
}

pub async fn get_sale(ctx: &AppContext, _who: &Identity, id: &str) -> ApiResult<SaleDetail> {
    let sale: Sale = super::get(ctx, id).await?;
    let filter = SaleItemFilter {
        sale_id: Some(sale.id.clone()),
        ..Default::default()
    };
    let items = super::list(ctx, &filter).await?;
    Ok(SaleDetail { sale, items })
}

/// Records a sale for an existing customer.
pub async fn create_sale(ctx: &AppContext, who: &Identity, draft: SaleDraft) -> ApiResult<Sale> {
    super::create(ctx, who, draft).await
}

pub async fn update_sale(
    ctx: &AppContext,
    who: &Identity,
    id: &str,
    patch: &SalePatch,
) -> ApiResult<Sale> {
    super::update(ctx, who, id, patch).await
}

/// Deletes a sale together with its lines.
pub async fn delete_sale(ctx: &AppContext, who: &Identity, id: &str) -> ApiResult<()> {
    super::delete::<Sale>(ctx, who, id).await
}

pub async fn add_sale_item(
    ctx: &AppContext,
    who: &Identity,
    draft: SaleItemDraft,
) -> ApiResult<SaleItem> {
    super::create(ctx, who, draft).await
}

pub async fn update_sale_item(
    ctx: &AppContext,
    who: &Identity,
    id: &str,
    patch: &SaleItemPatch,
) -> ApiResult<SaleItem> {
    super::update(ctx, who, id, patch).await
}

pub async fn remove_sale_item(ctx: &AppContext, who: &Identity, id: &str) -> ApiResult<()> {
    super::delete::<SaleItem>(ctx, who, id).await
}

/// Sales newest first, with customer names and line totals.
pub async fn sales_report(
    ctx: &AppContext,
    _who: &Identity,
    filter: &SaleFilter,
) -> ApiResult<Vec<SaleSummary>> {
    Ok(emporium_db::sales_report(&ctx.entities, filter).await?)
}
