//! # Reports
//!
//! Read-only views assembled from the entity store: the sales report and
//! the dashboard counts.
//!
//! A sale's `total_cents` is entered by the operator and never derived from
//! its items. The sales report puts both side by side:
//!
//! ```text
//! sale  total   items_total   reconciled
//! ───── ─────── ───────────── ──────────
//! S-1    37.80        37.80   true
//! S-2    50.00        42.00   false   ← total does not match the lines
//! ```

use emporium_core::{
    CustomerFilter, Money, Sale, SaleFilter, SaleItemFilter, SaleStatus,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::EntityStore;
use crate::error::DbResult;

/// One row of the sales report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleSummary {
    pub sale_id: String,
    pub customer_id: String,
    /// `None` when the customer record is missing.
    pub customer_name: Option<String>,
    pub sold_at: chrono::DateTime<chrono::Utc>,
    pub status: SaleStatus,
    pub total_cents: i64,
    pub item_count: usize,
    /// Sum of quantity × unit price over the sale's items.
    pub items_total_cents: i64,
    /// Whether the recorded total equals the items total.
    pub reconciled: bool,
}

impl SaleSummary {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    pub fn items_total(&self) -> Money {
        Money::from_cents(self.items_total_cents)
    }
}

/// Record counts for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub customers: u64,
    pub categories: u64,
    pub products: u64,
    pub sales: u64,
}

/// Builds the sales report, newest sale first.
pub async fn sales_report(entities: &EntityStore, filter: &SaleFilter) -> DbResult<Vec<SaleSummary>> {
    let sales = entities.sales().get_all(filter).await?;
    let items = entities.sale_items().get_all(&SaleItemFilter::default()).await?;
    let customers = entities.customers().get_all(&CustomerFilter::default()).await?;

    let names: HashMap<&str, &str> = customers
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut lines: HashMap<&str, (usize, Money)> = HashMap::new();
    for item in &items {
        let entry = lines.entry(item.sale_id.as_str()).or_insert((0, Money::zero()));
        entry.0 += 1;
        entry.1 += item.subtotal();
    }

    Ok(sales
        .iter()
        .map(|sale| summarize(sale, &names, &lines))
        .collect())
}

fn summarize(
    sale: &Sale,
    names: &HashMap<&str, &str>,
    lines: &HashMap<&str, (usize, Money)>,
) -> SaleSummary {
    let (item_count, items_total) = lines
        .get(sale.id.as_str())
        .copied()
        .unwrap_or((0, Money::zero()));

    SaleSummary {
        sale_id: sale.id.clone(),
        customer_id: sale.customer_id.clone(),
        customer_name: names.get(sale.customer_id.as_str()).map(|n| n.to_string()),
        sold_at: sale.sold_at,
        status: sale.status,
        total_cents: sale.total_cents,
        item_count,
        items_total_cents: items_total.cents(),
        reconciled: items_total == sale.total(),
    }
}

pub async fn dashboard_counts(entities: &EntityStore) -> DbResult<DashboardCounts> {
    Ok(DashboardCounts {
        customers: entities.customers().count().await?,
        categories: entities.categories().count().await?,
        products: entities.products().count().await?,
        sales: entities.sales().count().await?,
    })
}
