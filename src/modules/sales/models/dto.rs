// Request and response shapes for the sales API
//
// Requests are validated here, before any aggregate is built or loaded:
// ids present, 1..=20 items per sale, quantity 1..=20 and unit price > 0
// with at most two decimals per item. The aggregate itself only enforces the
// quantity ceiling.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sale::{Sale, SaleStatus};
use super::sale_item::{SaleItem, MAX_ITEM_QUANTITY};
use crate::core::{AppError, Result};

/// Maximum number of line items accepted in one create or update request
pub const MAX_ITEMS_PER_SALE: usize = 20;

/// Decimal places allowed on a unit price
pub const MAX_PRICE_SCALE: u32 = 2;

/// Request body for POST /api/sales
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: Uuid,
    pub subsidiary_id: Uuid,
    #[serde(default)]
    pub items: Vec<CreateSaleItemRequest>,
}

/// One line of a create request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Request body for PUT /api/sales/{id}
///
/// Items carrying an `id` that matches an existing line are updated, items
/// without one are added, and existing lines missing from the list are removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleRequest {
    pub customer_id: Uuid,
    pub subsidiary_id: Uuid,
    #[serde(default)]
    pub items: Vec<UpdateSaleItemRequest>,
}

/// One line of an update request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleItemRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl CreateSaleRequest {
    pub fn validate(&self) -> Result<()> {
        validate_parties(self.customer_id, self.subsidiary_id)?;

        if self.items.is_empty() {
            return Err(AppError::validation("At least one item is required"));
        }

        if self.items.len() > MAX_ITEMS_PER_SALE {
            return Err(AppError::validation(format!(
                "Maximum {} items allowed per sale",
                MAX_ITEMS_PER_SALE
            )));
        }

        for (idx, item) in self.items.iter().enumerate() {
            validate_line(idx, item.product_id, item.quantity, item.unit_price)?;
        }

        Ok(())
    }
}

impl UpdateSaleRequest {
    pub fn validate(&self) -> Result<()> {
        validate_parties(self.customer_id, self.subsidiary_id)?;

        if self.items.is_empty() {
            return Err(AppError::validation("Sale must have at least one item"));
        }

        if self.items.len() > MAX_ITEMS_PER_SALE {
            return Err(AppError::validation(format!(
                "Maximum {} items allowed per sale",
                MAX_ITEMS_PER_SALE
            )));
        }

        for (idx, item) in self.items.iter().enumerate() {
            validate_line(idx, item.product_id, item.quantity, item.unit_price)?;
        }

        Ok(())
    }
}

fn validate_parties(customer_id: Uuid, subsidiary_id: Uuid) -> Result<()> {
    if customer_id.is_nil() {
        return Err(AppError::validation("Customer ID is required"));
    }

    if subsidiary_id.is_nil() {
        return Err(AppError::validation("Subsidiary ID is required"));
    }

    Ok(())
}

fn validate_line(idx: usize, product_id: Uuid, quantity: i32, unit_price: Decimal) -> Result<()> {
    if product_id.is_nil() {
        return Err(AppError::validation(format!("Item {}: product ID is required", idx)));
    }

    if quantity <= 0 {
        return Err(AppError::validation(format!(
            "Item {}: quantity must be greater than 0, got: {}",
            idx, quantity
        )));
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(AppError::validation(format!(
            "Item {}: quantity cannot exceed {} units per item, got: {}",
            idx, MAX_ITEM_QUANTITY, quantity
        )));
    }

    if unit_price <= Decimal::ZERO {
        return Err(AppError::validation(format!(
            "Item {}: unit price must be greater than 0, got: {}",
            idx, unit_price
        )));
    }

    // matches the DECIMAL(18,2) storage column
    if unit_price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(AppError::validation(format!(
            "Item {}: unit price cannot have more than {} decimal places, got: {}",
            idx, MAX_PRICE_SCALE, unit_price
        )));
    }

    Ok(())
}

/// Full sale representation returned by get/create/update/complete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleResponse {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub subsidiary_id: Uuid,
    pub status: SaleStatus,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
    pub items: Vec<SaleItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_percentage: Decimal,
    pub total_amount: Decimal,
    pub is_cancelled: bool,
}

/// Row of the sales listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSummary {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub subsidiary_id: Uuid,
    pub status: SaleStatus,
    pub total_amount: Decimal,
    pub item_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response body for DELETE /api/sales/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSaleResponse {
    pub id: Uuid,
    pub success: bool,
    pub message: String,
}

impl From<&SaleItem> for SaleItemResponse {
    fn from(item: &SaleItem) -> Self {
        Self {
            id: item.id(),
            product_id: item.product_id(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            discount_percentage: item.discount_percentage(),
            total_amount: item.total_amount(),
            is_cancelled: item.is_cancelled(),
        }
    }
}

impl From<&Sale> for SaleResponse {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            sale_date: sale.sale_date(),
            customer_id: sale.customer_id(),
            subsidiary_id: sale.subsidiary_id(),
            status: sale.status(),
            total_amount: sale.total_amount(),
            total_discount: sale.total_discount(),
            items: sale.items().iter().map(SaleItemResponse::from).collect(),
            created_at: sale.created_at(),
            updated_at: sale.updated_at(),
        }
    }
}

impl From<&Sale> for SaleSummary {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            sale_date: sale.sale_date(),
            customer_id: sale.customer_id(),
            subsidiary_id: sale.subsidiary_id(),
            status: sale.status(),
            total_amount: sale.total_amount(),
            item_count: sale.item_count(),
            created_at: sale.created_at(),
            updated_at: sale.updated_at(),
        }
    }
}
