//! # Product Commands
//!
//! Product CRUD. Forms may attach an image; it is stored in the blob store
//! first and the product keeps only the handle.
//!
//! Quantity is set on creation only. Later stock changes go through the
//! commands in [`stock`](super::stock).

use emporium_core::{Product, ProductDraft, ProductFilter, ProductPatch};
use tracing::debug;

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::ApiResult;

/// An image attached to a product form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// Name the client gave the file.
    pub filename: String,
}

/// Lists products by name/description search, category and stock.
pub async fn list_products(
    ctx: &AppContext,
    _who: &Identity,
    filter: &ProductFilter,
) -> ApiResult<Vec<Product>> {
    super::list(ctx, filter).await
}

pub async fn get_product(ctx: &AppContext, _who: &Identity, id: &str) -> ApiResult<Product> {
    super::get(ctx, id).await
}

pub async fn create_product(
    ctx: &AppContext,
    who: &Identity,
    mut draft: ProductDraft,
    image: Option<ImageUpload>,
) -> ApiResult<Product> {
    if let Some(image) = image {
        draft.image = Some(save_image(ctx, image).await?);
    }
    super::create(ctx, who, draft).await
}

/// Updates a product. An attached image replaces the current one.
pub async fn update_product(
    ctx: &AppContext,
    who: &Identity,
    id: &str,
    patch: &ProductPatch,
    image: Option<ImageUpload>,
) -> ApiResult<Product> {
    match image {
        Some(image) => {
            let mut patch = patch.clone();
            patch.image = Some(Some(save_image(ctx, image).await?));
            super::update(ctx, who, id, &patch).await
        }
        None => super::update(ctx, who, id, patch).await,
    }
}

/// Deletes a product. Products listed on a sale are kept (409).
pub async fn delete_product(ctx: &AppContext, who: &Identity, id: &str) -> ApiResult<()> {
    super::delete::<Product>(ctx, who, id).await
}

async fn save_image(ctx: &AppContext, image: ImageUpload) -> ApiResult<String> {
    let handle = ctx.blobs.save(&image.bytes, &image.filename).await?;
    debug!(handle = %handle, "Product image stored");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;

    fn cafe() -> ProductDraft {
        ProductDraft {
            name: "Café 500g".into(),
            description: Some("Torrado e moído".into()),
            price_cents: 1890,
            quantity: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_image() {
        let (ctx, who, _dir) = context().await;

        let image = ImageUpload {
            bytes: b"\x89PNG".to_vec(),
            filename: "café.png".into(),
        };
        let product = create_product(&ctx, &who, cafe(), Some(image)).await.unwrap();

        let handle = product.image.clone().unwrap();
        assert!(handle.ends_with("_caf_.png"));
        assert_eq!(ctx.blobs.retrieve(&handle).await.unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_rename_keeps_price_and_quantity() {
        let (ctx, who, _dir) = context().await;
        let product = create_product(&ctx, &who, cafe(), None).await.unwrap();

        let patch = ProductPatch {
            name: Some("Café 1kg".into()),
            ..Default::default()
        };
        let updated = update_product(&ctx, &who, &product.id, &patch, None).await.unwrap();

        assert_eq!(updated.name, "Café 1kg");
        assert_eq!(updated.price_cents, 1890);
        assert_eq!(updated.quantity, 10);
        assert_eq!(updated.description, product.description);
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let (ctx, who, _dir) = context().await;
        let product = create_product(&ctx, &who, cafe(), None).await.unwrap();

        let patch = ProductPatch {
            price_cents: Some(-1),
            ..Default::default()
        };
        let err = update_product(&ctx, &who, &product.id, &patch, None)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(get_product(&ctx, &who, &product.id).await.unwrap().price_cents, 1890);
    }

    #[tokio::test]
    async fn test_dangling_category_allowed() {
        let (ctx, who, _dir) = context().await;
        let draft = ProductDraft {
            category_id: Some("no-such-category".into()),
            ..cafe()
        };

        // Dangling categories are allowed: the report shows "Uncategorized"
        let product = create_product(&ctx, &who, draft, None).await.unwrap();
        assert_eq!(product.category_id.as_deref(), Some("no-such-category"));
    }

    #[tokio::test]
    async fn test_oversized_image_rejected() {
        let (mut ctx, who, _dir) = context().await;
        ctx.blobs = std::sync::Arc::new(crate::uploads::FsBlobStore::new(
            ctx.config.uploads.dir.clone(),
            2,
        ));

        let image = ImageUpload {
            bytes: vec![0u8; 3],
            filename: "big.png".into(),
        };
        let err = create_product(&ctx, &who, cafe(), Some(image)).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(list_products(&ctx, &who, &ProductFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}
