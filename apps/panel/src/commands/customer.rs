//! # Customer Commands

use emporium_core::{Customer, CustomerDraft, CustomerFilter, CustomerPatch};

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::ApiResult;

/// Lists customers, optionally narrowed by a search over name, email,
/// phone and tax id.
pub async fn list_customers(
    ctx: &AppContext,
    _who: &Identity,
    filter: &CustomerFilter,
) -> ApiResult<Vec<Customer>> {
    super::list(ctx, filter).await
}

pub async fn get_customer(ctx: &AppContext, _who: &Identity, id: &str) -> ApiResult<Customer> {
    super::get(ctx, id).await
}

pub async fn create_customer(
    ctx: &AppContext,
    who: &Identity,
    draft: CustomerDraft,
) -> ApiResult<Customer> {
    super::create(ctx, who, draft).await
}

pub async fn update_customer(
    ctx: &AppContext,
    who: &Identity,
    id: &str,
    patch: &CustomerPatch,
) -> ApiResult<Customer> {
    super::update(ctx, who, id, patch).await
}

/// Deletes a customer. Customers with sales are kept (409).
pub async fn delete_customer(ctx: &AppContext, who: &Identity, id: &str) -> ApiResult<()> {
    super::delete::<Customer>(ctx, who, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::error::ErrorCode;

    fn draft(name: &str, email: Option<&str>) -> CustomerDraft {
        CustomerDraft {
            name: name.into(),
            email: email.map(str::to_string),
            city: Some("Recife".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let (ctx, who, _dir) = context().await;

        let created = create_customer(&ctx, &who, draft("Maria Silva", Some("maria@example.com")))
            .await
            .unwrap();
        assert_eq!(created.revision, 1);
        assert_eq!(get_customer(&ctx, &who, &created.id).await.unwrap(), created);

        let patch = CustomerPatch {
            phone: Some(Some("81 99999-0000".into())),
            ..Default::default()
        };
        let updated = update_customer(&ctx, &who, &created.id, &patch).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("81 99999-0000"));
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.revision, 2);

        delete_customer(&ctx, &who, &created.id).await.unwrap();
        let err = get_customer(&ctx, &who, &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = delete_customer(&ctx, &who, &created.id).await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_invalid_email_is_400() {
        let (ctx, who, _dir) = context().await;

        let err = create_customer(&ctx, &who, draft("João", Some("not-an-email")))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(list_customers(&ctx, &who, &CustomerFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_search_filter() {
        let (ctx, who, _dir) = context().await;
        create_customer(&ctx, &who, draft("Maria Silva", None)).await.unwrap();
        create_customer(&ctx, &who, draft("João Souza", None)).await.unwrap();

        let filter = CustomerFilter {
            search: Some("  SILVA ".into()),
        };
        let found = list_customers(&ctx, &who, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Maria Silva");
    }
}
