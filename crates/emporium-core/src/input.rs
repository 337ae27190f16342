//! # Drafts, Patches and Filters
//!
//! Typed inputs for the entity store.
//!
//! ```text
//! ┌──────────────┬─────────────────────────────────────────────────────────┐
//! │  Draft       │ every user-supplied field of a new record               │
//! │  Patch       │ Option per field: None = leave untouched                │
//! │              │ nullable fields use Option<Option<T>>:                  │
//! │              │   None → untouched, Some(None) → cleared, Some(v) → set │
//! │  Filter      │ narrows getAll(); Default matches everything            │
//! └──────────────┴─────────────────────────────────────────────────────────┘
//! ```
//!
//! A patch deserialized from JSON keeps the distinction between an absent
//! key and an explicit `null`:
//!
//! ```rust
//! use emporium_core::input::CustomerPatch;
//!
//! let absent: CustomerPatch = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();
//! assert_eq!(absent.email, None);
//!
//! let cleared: CustomerPatch = serde_json::from_str(r#"{"email":null}"#).unwrap();
//! assert_eq!(cleared.email, Some(None));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::SaleStatus;

/// Deserializes a present key (even `null`) as `Some(..)`.
///
/// Combine with `#[serde(default)]` so an absent key stays `None`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tax_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub postal_code: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerFilter {
    /// Matches name, email or tax id.
    #[serde(default)]
    pub search: Option<String>,
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryFilter {
    #[serde(default)]
    pub search: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Quantity is not patchable. Stock moves through the stock ledger.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub barcode: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductFilter {
    /// Matches name or barcode.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub customer_id: String,
    /// Defaults to the creation time.
    #[serde(default)]
    pub sold_at: Option<DateTime<Utc>>,
    pub total_cents: i64,
    /// Defaults to `completed`.
    #[serde(default)]
    pub status: Option<SaleStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SalePatch {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub sold_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub status: Option<SaleStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SaleFilter {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub status: Option<SaleStatus>,
}

// =============================================================================
// Sale Item
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleItemDraft {
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// The owning sale and the product are fixed once the line exists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SaleItemPatch {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SaleItemFilter {
    #[serde(default)]
    pub sale_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}
