//! # Domain Types
//!
//! Records persisted by the store and exchanged by the sync engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│     Product     │◄──│    SaleItem     │       │
//! │  │  ─────────────  │ 0..1 ─────────────  │   │  ─────────────  │       │
//! │  │  name, color    │   │  price_cents    │   │  quantity       │       │
//! │  │  icon           │   │  quantity       │   │  unit_price     │       │
//! │  └─────────────────┘   │  image (handle) │   └────────┬────────┘       │
//! │                        └─────────────────┘            │ owned by       │
//! │  ┌─────────────────┐   ┌─────────────────┐            │                │
//! │  │    Customer     │◄──│      Sale       │◄───────────┘                │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  name, email    │   │  total_cents    │                             │
//! │  │  tax_id         │   │  status         │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  Every record: id (UUID v4) • revision • created_at • updated_at        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Revisions
//! `revision` starts at 1 and is bumped by every local mutation. The sync
//! engine resolves conflicting copies of a record by comparing revisions,
//! so a record copied between stores keeps its revision verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Customer
// =============================================================================

/// A customer of the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// CPF or CNPJ.
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// `#RGB` or `#RRGGBB`.
    pub color: Option<String>,
    /// Icon name understood by the presentation layer.
    pub icon: Option<String>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
///
/// `quantity` is the single source of truth for stock status; there is no
/// separate stock table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Price in cents. Never negative.
    pub price_cents: i64,
    /// Units on hand. Never negative.
    pub quantity: i64,
    /// Nullable reference. A dangling id means "uncategorized".
    pub category_id: Option<String>,
    pub barcode: Option<String>,
    /// Blob store handle of the product image.
    pub image: Option<String>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Derived stock status.
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.quantity)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    /// Default: a sale is recorded after the fact.
    #[default]
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = crate::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            _ => Err(crate::ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "pending".to_string(),
                    "completed".to_string(),
                    "cancelled".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    pub sold_at: DateTime<Utc>,
    pub total_cents: i64,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Destroyed together with its sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in cents at the time of sale.
    pub unit_price_cents: i64,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// unit price × quantity
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Stock status derived from a product quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStatus {
    pub in_stock: bool,
    pub quantity: i64,
}

impl StockStatus {
    pub fn from_quantity(quantity: i64) -> Self {
        StockStatus {
            in_stock: quantity > 0,
            quantity,
        }
    }
}

/// One row of the stock report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockEntry {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price_cents: i64,
    pub category_name: String,
    pub image: Option<String>,
    pub barcode: Option<String>,
}

impl StockEntry {
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

// =============================================================================
// Users
// =============================================================================

/// Role of a panel user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Operator,
}

/// A user allowed to sign in to the panel. Not synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: UserRole,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_status_default_and_parse() {
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
        assert_eq!("Pending".parse::<SaleStatus>().unwrap(), SaleStatus::Pending);
        assert!("shipped".parse::<SaleStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&SaleStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_stock_status_derivation() {
        assert_eq!(
            StockStatus::from_quantity(0),
            StockStatus {
                in_stock: false,
                quantity: 0
            }
        );
        assert!(StockStatus::from_quantity(3).in_stock);
    }

    #[test]
    fn test_sale_item_subtotal() {
        let now = Utc::now();
        let item = SaleItem {
            id: "i".into(),
            sale_id: "s".into(),
            product_id: "p".into(),
            quantity: 3,
            unit_price_cents: 450,
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(item.subtotal().cents(), 1350);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: "u".into(),
            username: "admin".into(),
            display_name: "Administrador".into(),
            email: None,
            role: UserRole::Admin,
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
    }
}
