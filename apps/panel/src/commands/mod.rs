//! # Commands Module
//!
//! Typed functions the web layer calls, one per panel action.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (shared CRUD helpers)
//! ├── customer.rs  ◄─── Customer CRUD
//! ├── category.rs  ◄─── Category CRUD
//! ├── product.rs   ◄─── Product CRUD with image upload
//! ├── stock.rs     ◄─── Stock adjust/set/status/report
//! ├── sale.rs      ◄─── Sales, sale items, sales report
//! ├── sync.rs      ◄─── Sync start/stop/force/status
//! └── system.rs    ◄─── Login, API status, dashboard, images
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  web layer: token from cookie/header                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ctx.auth.authorize(token) ──► Identity                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commands::product::update_product(&ctx, &identity, id, patch, None)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Result<Product, ApiError>  ──► 200 JSON  |  status + {"erro": ...}     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command touching panel data takes an [`Identity`]; only the auth
//! gate can produce one, so an unauthenticated call does not type-check.

use emporium_db::Stored;
use tracing::{debug, info};

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};

pub mod category;
pub mod customer;
pub mod product;
pub mod sale;
pub mod stock;
pub mod sync;
pub mod system;

pub(crate) async fn list<E: Stored>(ctx: &AppContext, filter: &E::Filter) -> ApiResult<Vec<E>> {
    let records = ctx.entities.collection::<E>().get_all(filter).await?;
    debug!(kind = %E::KIND, count = records.len(), "list command");
    Ok(records)
}

pub(crate) async fn get<E: Stored>(ctx: &AppContext, id: &str) -> ApiResult<E> {
    Ok(ctx.entities.collection::<E>().get_by_id(id).await?)
}

/// Creates the record and returns it as stored.
pub(crate) async fn create<E: Stored>(
    ctx: &AppContext,
    who: &Identity,
    draft: E::Draft,
) -> ApiResult<E> {
    let collection = ctx.entities.collection::<E>();
    let id = collection.create(draft).await?;
    info!(kind = %E::KIND, id = %id, user = %who.username(), "Record created");
    Ok(collection.get_by_id(&id).await?)
}

/// Applies the patch and returns the record as stored.
pub(crate) async fn update<E: Stored>(
    ctx: &AppContext,
    who: &Identity,
    id: &str,
    patch: &E::Patch,
) -> ApiResult<E> {
    let collection = ctx.entities.collection::<E>();
    if collection.update(id, patch).await? {
        info!(kind = %E::KIND, id = %id, user = %who.username(), "Record updated");
    } else {
        debug!(kind = %E::KIND, id = %id, "Update changed nothing");
    }
    Ok(collection.get_by_id(id).await?)
}

/// Deletes the record. A missing id is a 404 here.
pub(crate) async fn delete<E: Stored>(ctx: &AppContext, who: &Identity, id: &str) -> ApiResult<()> {
    if !ctx.entities.collection::<E>().delete(id).await? {
        return Err(ApiError::not_found(E::KIND.label(), id));
    }
    info!(kind = %E::KIND, id = %id, user = %who.username(), "Record deleted");
    Ok(())
}
