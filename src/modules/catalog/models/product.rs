use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product
///
/// `unit_price` is the list price. A sale line carries its own price, which
/// is what totals are computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(name: impl Into<String>, sku: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            unit_price,
            sku: sku.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}
