//! # Category Commands

use emporium_core::{Category, CategoryDraft, CategoryFilter, CategoryPatch};

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::ApiResult;

pub async fn list_categories(
    ctx: &AppContext,
    _who: &Identity,
    filter: &CategoryFilter,
) -> ApiResult<Vec<Category>> {
    super::list(ctx, filter).await
}

pub async fn get_category(ctx: &AppContext, _who: &Identity, id: &str) -> ApiResult<Category> {
    super::get(ctx, id).await
}

pub async fn create_category(
    ctx: &AppContext,
    who: &Identity,
    draft: CategoryDraft,
) -> ApiResult<Category> {
    super::create(ctx, who, draft).await
}

pub async fn update_category(
    ctx: &AppContext,
    who: &Identity,
    id: &str,
    patch: &CategoryPatch,
) -> ApiResult<Category> {
    super::update(ctx, who, id, patch).await
}

/// Deletes a category. Categories still used by a product are kept (409).
pub async fn delete_category(ctx: &AppContext, who: &Identity, id: &str) -> ApiResult<()> {
    super::delete::<Category>(ctx, who, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::create_product;
    use crate::error::ErrorCode;
    use crate::commands::test_support::context;
    use emporium_core::ProductDraft;

    #[tokio::test]
    async fn test_referenced_category_delete_is_409() {
        let (ctx, who, _dir) = context().await;

        let category = create_category(
            &ctx,
            &who,
            CategoryDraft {
                name: "Bebidas".into(),
                color: Some("#3366ff".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let product = create_product(
            &ctx,
            &who,
            ProductDraft {
                name: "Suco de Uva 1L".into(),
                price_cents: 990,
                quantity: 4,
                category_id: Some(category.id.clone()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        let err = delete_category(&ctx, &who, &category.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.http_status(), 409);

        assert!(get_category(&ctx, &who, &category.id).await.is_ok());
        assert!(crate::commands::product::get_product(&ctx, &who, &product.id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_clear_optional_field() {
        let (ctx, who, _dir) = context().await;
        let category = create_category(
            &ctx,
            &who,
            CategoryDraft {
                name: "Limpeza".into(),
                description: Some("Produtos de limpeza".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let patch = CategoryPatch {
            description: Some(None),
            ..Default::default()
        };
        let updated = update_category(&ctx, &who, &category.id, &patch).await.unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, "Limpeza");
    }
}
