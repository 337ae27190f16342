//! # Entity Trait
//!
//! The contract every persisted record fulfils, so the store facade and the
//! sync engine can be written once and instantiated per record type.
//!
//! ## Lifecycle of a Record
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Draft ──from_draft(id, now)──► Entity (revision 1) ──► validate()     │
//! │                                      │                                  │
//! │   Patch ──apply_patch()──────────────┤ merge into a copy, validate,     │
//! │                                      │ report whether anything changed  │
//! │                                      ▼                                  │
//! │                                 touch(now)  revision += 1               │
//! │                                                                         │
//! │   Sync copies records between stores verbatim: no touch, same revision  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::input::*;
use crate::types::{Category, Customer, Product, Sale, SaleItem, SaleStatus};
use crate::validation::{
    normalize_search, validate_amount_cents, validate_color, validate_email,
    validate_line_quantity, validate_name, validate_stock_quantity, validate_uuid,
    ValidationResult,
};

// =============================================================================
// Entity Kind
// =============================================================================

/// The synchronized record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Customer,
    Product,
    Sale,
    SaleItem,
}

impl EntityKind {
    /// Reconciliation order. Referenced kinds come before the kinds that
    /// reference them, so a pulled record never points at a missing parent.
    pub const SYNC_ORDER: [EntityKind; 5] = [
        EntityKind::Category,
        EntityKind::Customer,
        EntityKind::Product,
        EntityKind::Sale,
        EntityKind::SaleItem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Customer => "customer",
            EntityKind::Product => "product",
            EntityKind::Sale => "sale",
            EntityKind::SaleItem => "sale_item",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Category => "Category",
            EntityKind::Customer => "Customer",
            EntityKind::Product => "Product",
            EntityKind::Sale => "Sale",
            EntityKind::SaleItem => "Sale item",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference from one record to another that must exist when written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    pub kind: EntityKind,
    pub field: &'static str,
    pub id: &'a str,
}

// =============================================================================
// Entity Trait
// =============================================================================

/// A persisted, synchronized domain record.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    type Draft: fmt::Debug + Send + Sync;
    type Patch: fmt::Debug + Default + Send + Sync;
    type Filter: fmt::Debug + Default + Send + Sync;

    fn id(&self) -> &str;

    fn revision(&self) -> i64;

    /// Builds a new record at revision 1 and validates it.
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> ValidationResult<Self>;

    /// Merges `patch` into the record.
    ///
    /// ## Returns
    /// - `Ok(true)` if the record changed (and is valid)
    /// - `Ok(false)` if the patch was empty or set every field to its
    ///   current value; the record is untouched
    /// - `Err(..)` if the merged record is invalid; the record is untouched
    fn apply_patch(&mut self, patch: &Self::Patch) -> ValidationResult<bool>;

    /// Marks a local mutation: bumps the revision and `updated_at`.
    fn touch(&mut self, now: DateTime<Utc>);

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn validate(&self) -> ValidationResult<()>;

    /// Records that must exist for this one to be written.
    fn links(&self) -> Vec<Link<'_>> {
        Vec::new()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Blank optional text is stored as NULL.
fn clean(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn set<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *field = v.clone();
    }
}

fn set_text(field: &mut Option<String>, value: &Option<Option<String>>) {
    if let Some(v) = value {
        *field = clean(v.clone());
    }
}

/// Applies `merge` to a copy, validates it and swaps it in when it differs.
fn merge_into<E: Entity>(entity: &mut E, merge: impl FnOnce(&mut E)) -> ValidationResult<bool> {
    let mut next = entity.clone();
    merge(&mut next);
    if next == *entity {
        return Ok(false);
    }
    next.validate()?;
    *entity = next;
    Ok(true)
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn search_matches(search: &Option<String>, fields: &[Option<&str>]) -> bool {
    match search.as_deref().and_then(normalize_search) {
        None => true,
        Some(needle) => fields.iter().any(|f| contains(*f, &needle)),
    }
}

// =============================================================================
// Customer
// =============================================================================

impl Entity for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    type Draft = CustomerDraft;
    type Patch = CustomerPatch;
    type Filter = CustomerFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> i64 {
        self.revision
    }

    fn from_draft(id: String, draft: CustomerDraft, now: DateTime<Utc>) -> ValidationResult<Self> {
        let customer = Customer {
            id,
            name: draft.name,
            email: clean(draft.email),
            phone: clean(draft.phone),
            tax_id: clean(draft.tax_id),
            address: clean(draft.address),
            city: clean(draft.city),
            state: clean(draft.state),
            postal_code: clean(draft.postal_code),
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        customer.validate()?;
        Ok(customer)
    }

    fn apply_patch(&mut self, patch: &CustomerPatch) -> ValidationResult<bool> {
        merge_into(self, |c| {
            set(&mut c.name, &patch.name);
            set_text(&mut c.email, &patch.email);
            set_text(&mut c.phone, &patch.phone);
            set_text(&mut c.tax_id, &patch.tax_id);
            set_text(&mut c.address, &patch.address);
            set_text(&mut c.city, &patch.city);
            set_text(&mut c.state, &patch.state);
            set_text(&mut c.postal_code, &patch.postal_code);
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    fn matches(&self, filter: &CustomerFilter) -> bool {
        search_matches(
            &filter.search,
            &[
                Some(self.name.as_str()),
                self.email.as_deref(),
                self.tax_id.as_deref(),
            ],
        )
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

// =============================================================================
// Category
// =============================================================================

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;

    type Draft = CategoryDraft;
    type Patch = CategoryPatch;
    type Filter = CategoryFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> i64 {
        self.revision
    }

    fn from_draft(id: String, draft: CategoryDraft, now: DateTime<Utc>) -> ValidationResult<Self> {
        let category = Category {
            id,
            name: draft.name,
            description: clean(draft.description),
            color: clean(draft.color),
            icon: clean(draft.icon),
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        category.validate()?;
        Ok(category)
    }

    fn apply_patch(&mut self, patch: &CategoryPatch) -> ValidationResult<bool> {
        merge_into(self, |c| {
            set(&mut c.name, &patch.name);
            set_text(&mut c.description, &patch.description);
            set_text(&mut c.color, &patch.color);
            set_text(&mut c.icon, &patch.icon);
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    fn matches(&self, filter: &CategoryFilter) -> bool {
        search_matches(
            &filter.search,
            &[Some(self.name.as_str()), self.description.as_deref()],
        )
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(())
    }
}

// =============================================================================
// Product
// =============================================================================

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Product;

    type Draft = ProductDraft;
    type Patch = ProductPatch;
    type Filter = ProductFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> i64 {
        self.revision
    }

    fn from_draft(id: String, draft: ProductDraft, now: DateTime<Utc>) -> ValidationResult<Self> {
        let product = Product {
            id,
            name: draft.name,
            description: clean(draft.description),
            price_cents: draft.price_cents,
            quantity: draft.quantity,
            category_id: clean(draft.category_id),
            barcode: clean(draft.barcode),
            image: clean(draft.image),
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    fn apply_patch(&mut self, patch: &ProductPatch) -> ValidationResult<bool> {
        merge_into(self, |p| {
            set(&mut p.name, &patch.name);
            set_text(&mut p.description, &patch.description);
            set(&mut p.price_cents, &patch.price_cents);
            set_text(&mut p.category_id, &patch.category_id);
            set_text(&mut p.barcode, &patch.barcode);
            set_text(&mut p.image, &patch.image);
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        if let Some(category_id) = &filter.category_id {
            if self.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }
        if let Some(in_stock) = filter.in_stock {
            if self.in_stock() != in_stock {
                return false;
            }
        }
        search_matches(
            &filter.search,
            &[Some(self.name.as_str()), self.barcode.as_deref()],
        )
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_amount_cents("price", self.price_cents)?;
        validate_stock_quantity(self.quantity)?;
        Ok(())
    }
}

// =============================================================================
// Sale
// =============================================================================

impl Entity for Sale {
    const KIND: EntityKind = EntityKind::Sale;

    type Draft = SaleDraft;
    type Patch = SalePatch;
    type Filter = SaleFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> i64 {
        self.revision
    }

    fn from_draft(id: String, draft: SaleDraft, now: DateTime<Utc>) -> ValidationResult<Self> {
        let sale = Sale {
            id,
            customer_id: draft.customer_id,
            sold_at: draft.sold_at.unwrap_or(now),
            total_cents: draft.total_cents,
            status: draft.status.unwrap_or_default(),
            notes: clean(draft.notes),
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        sale.validate()?;
        Ok(sale)
    }

    fn apply_patch(&mut self, patch: &SalePatch) -> ValidationResult<bool> {
        merge_into(self, |s| {
            set(&mut s.customer_id, &patch.customer_id);
            set(&mut s.sold_at, &patch.sold_at);
            set(&mut s.total_cents, &patch.total_cents);
            set::<SaleStatus>(&mut s.status, &patch.status);
            set_text(&mut s.notes, &patch.notes);
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    fn matches(&self, filter: &SaleFilter) -> bool {
        filter
            .customer_id
            .as_ref()
            .map_or(true, |c| *c == self.customer_id)
            && filter.status.map_or(true, |s| s == self.status)
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_uuid("customer_id", &self.customer_id)?;
        validate_amount_cents("total", self.total_cents)?;
        Ok(())
    }

    fn links(&self) -> Vec<Link<'_>> {
        vec![Link {
            kind: EntityKind::Customer,
            field: "customer_id",
            id: &self.customer_id,
        }]
    }
}

// =============================================================================
// Sale Item
// =============================================================================

impl Entity for SaleItem {
    const KIND: EntityKind = EntityKind::SaleItem;

    type Draft = SaleItemDraft;
    type Patch = SaleItemPatch;
    type Filter = SaleItemFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> i64 {
        self.revision
    }

    fn from_draft(id: String, draft: SaleItemDraft, now: DateTime<Utc>) -> ValidationResult<Self> {
        let item = SaleItem {
            id,
            sale_id: draft.sale_id,
            product_id: draft.product_id,
            quantity: draft.quantity,
            unit_price_cents: draft.unit_price_cents,
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        item.validate()?;
        Ok(item)
    }

    fn apply_patch(&mut self, patch: &SaleItemPatch) -> ValidationResult<bool> {
        merge_into(self, |i| {
            set(&mut i.quantity, &patch.quantity);
            set(&mut i.unit_price_cents, &patch.unit_price_cents);
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    fn matches(&self, filter: &SaleItemFilter) -> bool {
        filter.sale_id.as_ref().map_or(true, |s| *s == self.sale_id)
            && filter
                .product_id
                .as_ref()
                .map_or(true, |p| *p == self.product_id)
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_uuid("sale_id", &self.sale_id)?;
        validate_uuid("product_id", &self.product_id)?;
        validate_line_quantity(self.quantity)?;
        validate_amount_cents("unit_price", self.unit_price_cents)?;
        Ok(())
    }

    fn links(&self) -> Vec<Link<'_>> {
        vec![
            Link {
                kind: EntityKind::Sale,
                field: "sale_id",
                id: &self.sale_id,
            },
            Link {
                kind: EntityKind::Product,
                field: "product_id",
                id: &self.product_id,
            },
        ]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    fn product() -> Product {
        let draft = ProductDraft {
            name: "Café 500g".to_string(),
            description: Some("Torrado".to_string()),
            price_cents: 1890,
            quantity: 12,
            category_id: None,
            barcode: Some("7891000".to_string()),
            image: None,
        };
        Product::from_draft("p-1".to_string(), draft, Utc::now()).unwrap()
    }

    #[test]
    fn test_from_draft_starts_at_revision_one() {
        let p = product();
        assert_eq!(p.revision, 1);
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn test_from_draft_rejects_invalid() {
        let err = Product::from_draft(
            "p".into(),
            ProductDraft {
                name: "Açúcar".into(),
                price_cents: -1,
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::Negative { .. }));

        let err = Customer::from_draft(
            "c".into(),
            CustomerDraft {
                name: "Ana".into(),
                email: Some("not-an-email".into()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_blank_optional_text_is_none() {
        let c = Customer::from_draft(
            "c".into(),
            CustomerDraft {
                name: "Ana".into(),
                email: Some("   ".into()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(c.email, None);
    }

    #[test]
    fn test_patch_leaves_absent_fields_untouched() {
        let mut p = product();
        let before = p.clone();

        let changed = p
            .apply_patch(&ProductPatch {
                name: Some("Café 1kg".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(changed);
        assert_eq!(p.name, "Café 1kg");
        assert_eq!(p.price_cents, before.price_cents);
        assert_eq!(p.quantity, before.quantity);
        assert_eq!(p.description, before.description);
        assert_eq!(p.barcode, before.barcode);
    }

    #[test]
    fn test_patch_clears_nullable_field() {
        let mut p = product();
        p.apply_patch(&ProductPatch {
            barcode: Some(None),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(p.barcode, None);
    }

    #[test]
    fn test_noop_and_invalid_patches_do_not_modify() {
        let mut p = product();
        let before = p.clone();

        assert!(!p.apply_patch(&ProductPatch::default()).unwrap());
        assert!(!p
            .apply_patch(&ProductPatch {
                price_cents: Some(before.price_cents),
                ..Default::default()
            })
            .unwrap());

        assert!(p
            .apply_patch(&ProductPatch {
                name: Some("   ".into()),
                ..Default::default()
            })
            .is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn test_touch_bumps_revision() {
        let mut p = product();
        let later = p.updated_at + chrono::Duration::seconds(5);
        p.touch(later);
        assert_eq!(p.revision, 2);
        assert_eq!(p.updated_at, later);
    }

    #[test]
    fn test_product_filter() {
        let p = product();
        assert!(p.matches(&ProductFilter::default()));
        assert!(p.matches(&ProductFilter {
            search: Some("CAFÉ".into()),
            ..Default::default()
        }));
        assert!(p.matches(&ProductFilter {
            search: Some("7891".into()),
            in_stock: Some(true),
            ..Default::default()
        }));
        assert!(!p.matches(&ProductFilter {
            in_stock: Some(false),
            ..Default::default()
        }));
        assert!(!p.matches(&ProductFilter {
            category_id: Some("cat".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_sale_links_and_defaults() {
        let customer_id = uuid::Uuid::new_v4().to_string();
        let sale = Sale::from_draft(
            "s".into(),
            SaleDraft {
                customer_id: customer_id.clone(),
                total_cents: 5000,
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.sold_at, sale.created_at);
        assert_eq!(
            sale.links(),
            vec![Link {
                kind: EntityKind::Customer,
                field: "customer_id",
                id: &customer_id
            }]
        );
    }

    #[test]
    fn test_sale_item_requires_positive_quantity() {
        let err = SaleItem::from_draft(
            "i".into(),
            SaleItemDraft {
                sale_id: uuid::Uuid::new_v4().to_string(),
                product_id: uuid::Uuid::new_v4().to_string(),
                quantity: 0,
                unit_price_cents: 100,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_sync_order_puts_parents_first() {
        let pos = |k| EntityKind::SYNC_ORDER.iter().position(|x| *x == k).unwrap();
        assert!(pos(EntityKind::Category) < pos(EntityKind::Product));
        assert!(pos(EntityKind::Customer) < pos(EntityKind::Sale));
        assert!(pos(EntityKind::Sale) < pos(EntityKind::SaleItem));
        assert!(pos(EntityKind::Product) < pos(EntityKind::SaleItem));
    }
}
