// Sale aggregate: order header, status lifecycle and line items
//
// State machine:
//   Pending   --add/update/remove/cancel item--> Pending
//   Pending   --complete()--> Completed
//   Pending   --cancel()----> Cancelled
//   Completed --cancel()----> Cancelled
//   Cancelled --cancel()----> Cancelled (no-op), everything else rejected
//
// total_amount is recomputed after every item-collection mutation and on
// cancel(), so it always matches the current items and status.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SaleError;
use super::sale_item::{SaleItem, MAX_ITEM_QUANTITY};

/// Maximum length of a stored sale number
pub const MAX_SALE_NUMBER_LEN: usize = 50;

/// Sale status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleStatus {
    /// Created, items may still change
    Pending,

    /// Closed for item changes; can still be cancelled
    Completed,

    /// Terminal; totals are zero
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "Pending",
            SaleStatus::Completed => "Completed",
            SaleStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    /// Case-insensitive; anything outside the three statuses is rejected
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            _ => Err(format!(
                "Invalid sale status: {}. Status must be 'Pending', 'Completed', or 'Cancelled'",
                s
            )),
        }
    }
}

/// Stored header of a sale, used to rehydrate it from the database
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub subsidiary_id: Uuid,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Represents a sale and its line items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sale {
    id: Uuid,
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer_id: Uuid,
    subsidiary_id: Uuid,
    status: SaleStatus,
    items: Vec<SaleItem>,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Create a new pending sale with no items
    pub fn new(customer_id: Uuid, subsidiary_id: Uuid) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            sale_number: Self::generate_sale_number(now),
            sale_date: now,
            customer_id,
            subsidiary_id,
            status: SaleStatus::Pending,
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            created_at: now,
            updated_at: None,
        }
    }

    /// Create a pending sale from an initial batch of line items
    ///
    /// Every item goes through [`add_item`](Self::add_item), so the discount
    /// rules apply to the initial batch exactly as to later additions.
    pub fn with_items(
        customer_id: Uuid,
        subsidiary_id: Uuid,
        items: Vec<SaleItem>,
    ) -> Result<Self, SaleError> {
        let mut sale = Self::new(customer_id, subsidiary_id);
        for item in items {
            sale.add_item(item)?;
        }
        Ok(sale)
    }

    /// Rebuild a sale from storage without construction side effects
    pub fn restore(record: SaleRecord, items: Vec<SaleItem>) -> Self {
        let mut sale = Self {
            id: record.id,
            sale_number: record.sale_number,
            sale_date: record.sale_date,
            customer_id: record.customer_id,
            subsidiary_id: record.subsidiary_id,
            status: record.status,
            items,
            total_amount: Decimal::ZERO,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        sale.total_amount = sale.calculate_total();
        sale
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sale_number(&self) -> &str {
        &self.sale_number
    }

    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn subsidiary_id(&self) -> Uuid {
        self.subsidiary_id
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn find_item(&self, item_id: Uuid) -> Option<&SaleItem> {
        self.items.iter().find(|item| item.id() == item_id)
    }

    pub fn active_items(&self) -> impl Iterator<Item = &SaleItem> {
        self.items.iter().filter(|item| !item.is_cancelled())
    }

    /// Sum of the discounts granted on active items
    pub fn total_discount(&self) -> Decimal {
        if self.status == SaleStatus::Cancelled {
            return Decimal::ZERO;
        }

        self.active_items().map(SaleItem::discount_amount).sum()
    }

    /// Sum of active item totals, or zero for a cancelled sale
    pub fn calculate_total(&self) -> Decimal {
        if self.status == SaleStatus::Cancelled {
            return Decimal::ZERO;
        }

        self.items.iter().map(SaleItem::calculate_total).sum()
    }

    /// Add a line item, applying the discount rules to it
    ///
    /// # Errors
    /// * `InvalidState` - sale is cancelled or completed
    /// * `DiscountRuleViolation` - quantity above 20; the item is not added
    pub fn add_item(&mut self, mut item: SaleItem) -> Result<Uuid, SaleError> {
        match self.status {
            SaleStatus::Cancelled => {
                return Err(SaleError::invalid_state(
                    "You cannot add items to a cancelled sale",
                ))
            }
            SaleStatus::Completed => {
                return Err(SaleError::invalid_state(
                    "You cannot add items to a completed sale",
                ))
            }
            SaleStatus::Pending => {}
        }

        item.attach_to(self.id);
        item.apply_discount_rules()?;

        let item_id = item.id();
        self.items.push(item);
        self.touch();
        Ok(item_id)
    }

    /// Change quantity and unit price of an active item
    ///
    /// # Errors
    /// * `InvalidState` - sale is cancelled or completed, or item is cancelled
    /// * `NotFound` - no item with this id
    /// * `DiscountRuleViolation` - quantity above 20; the item is unchanged
    pub fn update_item(
        &mut self,
        item_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<(), SaleError> {
        match self.status {
            SaleStatus::Cancelled => {
                return Err(SaleError::invalid_state(
                    "Cannot update items in a cancelled sale",
                ))
            }
            SaleStatus::Completed => {
                return Err(SaleError::invalid_state(
                    "Cannot update items in a completed sale",
                ))
            }
            SaleStatus::Pending => {}
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == item_id)
            .ok_or_else(|| SaleError::item_not_found(item_id))?;

        if item.is_cancelled() {
            return Err(SaleError::invalid_state("Cannot update a cancelled item"));
        }

        item.reprice(quantity, unit_price)?;
        self.touch();
        Ok(())
    }

    /// Remove an item from the sale entirely
    ///
    /// # Errors
    /// * `InvalidState` - sale is cancelled or completed
    /// * `NotFound` - no item with this id, cancelled or not
    pub fn remove_item(&mut self, item_id: Uuid) -> Result<SaleItem, SaleError> {
        match self.status {
            SaleStatus::Cancelled => {
                return Err(SaleError::invalid_state(
                    "Cannot remove items from a cancelled sale",
                ))
            }
            SaleStatus::Completed => {
                return Err(SaleError::invalid_state(
                    "Cannot remove items from a completed sale",
                ))
            }
            SaleStatus::Pending => {}
        }

        let position = self
            .items
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or_else(|| SaleError::item_not_found(item_id))?;

        let removed = self.items.remove(position);
        self.touch();
        Ok(removed)
    }

    /// Cancel one item, excluding it from the total
    ///
    /// Allowed on pending and completed sales.
    ///
    /// # Errors
    /// * `InvalidState` - sale is cancelled, or item already cancelled
    /// * `NotFound` - no item with this id
    pub fn cancel_item(&mut self, item_id: Uuid) -> Result<(), SaleError> {
        if self.status == SaleStatus::Cancelled {
            return Err(SaleError::invalid_state(
                "Cannot cancel items in a cancelled sale",
            ));
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == item_id)
            .ok_or_else(|| SaleError::item_not_found(item_id))?;

        if item.is_cancelled() {
            return Err(SaleError::invalid_state("Item is already cancelled"));
        }

        item.cancel();
        self.touch();
        Ok(())
    }

    /// Cancel the sale; always succeeds
    ///
    /// Cancelling an already cancelled sale leaves it exactly as it was.
    pub fn cancel(&mut self) {
        if self.status == SaleStatus::Cancelled {
            return;
        }

        self.status = SaleStatus::Cancelled;
        self.touch();
    }

    /// Close the sale for further item changes
    ///
    /// # Errors
    /// * `InvalidState` - sale cancelled, already completed, or has no active items
    pub fn complete(&mut self) -> Result<(), SaleError> {
        match self.status {
            SaleStatus::Cancelled => {
                return Err(SaleError::invalid_state("Cannot complete a cancelled sale"))
            }
            SaleStatus::Completed => {
                return Err(SaleError::invalid_state("Sale is already completed"))
            }
            SaleStatus::Pending => {}
        }

        if self.active_items().next().is_none() {
            return Err(SaleError::invalid_state(
                "Cannot complete a sale with no active items",
            ));
        }

        self.status = SaleStatus::Completed;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Point the sale at another customer and subsidiary
    ///
    /// # Errors
    /// * `InvalidState` - sale is not pending
    pub fn reassign(&mut self, customer_id: Uuid, subsidiary_id: Uuid) -> Result<(), SaleError> {
        if self.status != SaleStatus::Pending {
            return Err(SaleError::invalid_state(format!(
                "Cannot change customer or subsidiary of a {} sale",
                self.status.as_str().to_lowercase()
            )));
        }

        if self.customer_id != customer_id || self.subsidiary_id != subsidiary_id {
            self.customer_id = customer_id;
            self.subsidiary_id = subsidiary_id;
            self.updated_at = Some(Utc::now());
        }

        Ok(())
    }

    /// Entity-level consistency checks
    ///
    /// Returns every violated rule; an empty list means the sale is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sale_number.trim().is_empty() {
            errors.push("Sale number is required".to_string());
        } else if self.sale_number.len() > MAX_SALE_NUMBER_LEN {
            errors.push(format!(
                "Sale number must be between 1 and {} characters",
                MAX_SALE_NUMBER_LEN
            ));
        }

        if self.sale_date > Utc::now() {
            errors.push("Sale date cannot be in the future".to_string());
        }

        if self.customer_id.is_nil() {
            errors.push("Customer ID is required".to_string());
        }

        if self.subsidiary_id.is_nil() {
            errors.push("Subsidiary ID is required".to_string());
        }

        if self.items.is_empty() {
            errors.push("Sale must have at least one item".to_string());
        } else if self.active_items().next().is_none() {
            errors.push("Sale must have at least one active (non-cancelled) item".to_string());
        }

        for (idx, item) in self.items.iter().enumerate() {
            if !(0..=MAX_ITEM_QUANTITY).contains(&item.quantity()) {
                errors.push(format!(
                    "Item {}: quantity must be between 0 and {}",
                    idx, MAX_ITEM_QUANTITY
                ));
            }
            if item.unit_price() <= Decimal::ZERO {
                errors.push(format!("Item {}: unit price must be greater than zero", idx));
            }
            if item.discount_percentage() < Decimal::ZERO
                || item.discount_percentage() > Decimal::ONE_HUNDRED
            {
                errors.push(format!(
                    "Item {}: discount percentage must be between 0 and 100",
                    idx
                ));
            }
        }

        errors
    }

    fn touch(&mut self) {
        self.total_amount = self.calculate_total();
        self.updated_at = Some(Utc::now());
    }

    /// `<yyyyMMddHHmmss><4-digit suffix>`
    ///
    /// Uniqueness is only enforced by the storage constraint.
    fn generate_sale_number(now: DateTime<Utc>) -> String {
        let mut rng = rand::thread_rng();
        let suffix: u16 = rng.gen_range(1000..=9999);
        format!("{}{}", now.format("%Y%m%d%H%M%S"), suffix)
    }
}
