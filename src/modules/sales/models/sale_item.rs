// Line item pricing for the sale aggregate
//
// A sale item carries one product reference with its quantity, unit price,
// quantity-tier discount and cancellation flag. It owns only its own total;
// the owning Sale decides when that total feeds into the sale total.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::error::SaleError;

/// Maximum number of identical units allowed in one line item
pub const MAX_ITEM_QUANTITY: i32 = 20;

/// Smallest quantity that earns the 10% tier
const TIER_ONE_MIN_QUANTITY: i32 = 4;

/// Smallest quantity that earns the 20% tier
const TIER_TWO_MIN_QUANTITY: i32 = 10;

/// Represents a single line item in a sale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleItem {
    id: Uuid,
    sale_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    discount_percentage: Decimal,
    is_cancelled: bool,
    total_amount: Decimal,
}

/// Stored state of a line item, used to rehydrate it from the database
#[derive(Debug, Clone)]
pub struct SaleItemRecord {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_percentage: Decimal,
    pub is_cancelled: bool,
}

impl SaleItem {
    /// Create a new, not yet attached line item
    ///
    /// Discount and total are left at zero until the item is added to a
    /// sale, which applies the discount rules.
    pub fn new(product_id: Uuid, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            sale_id: Uuid::nil(),
            product_id,
            quantity,
            unit_price,
            discount_percentage: Decimal::ZERO,
            is_cancelled: false,
            total_amount: Decimal::ZERO,
        }
    }

    /// Rebuild an item from storage
    ///
    /// The stored discount is kept as-is; the total is recomputed from it.
    pub fn restore(record: SaleItemRecord) -> Self {
        let mut item = Self {
            id: record.id,
            sale_id: record.sale_id,
            product_id: record.product_id,
            quantity: record.quantity,
            unit_price: record.unit_price,
            discount_percentage: record.discount_percentage,
            is_cancelled: record.is_cancelled,
            total_amount: Decimal::ZERO,
        };
        item.total_amount = item.calculate_total();
        item
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sale_id(&self) -> Uuid {
        self.sale_id
    }

    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn discount_percentage(&self) -> Decimal {
        self.discount_percentage
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Discount tier for the current quantity
    ///
    /// | quantity   | discount |
    /// |------------|----------|
    /// | `< 4`      | 0%       |
    /// | `4..10`    | 10%      |
    /// | `10..=20`  | 20%      |
    ///
    /// Quantities above 20 never reach this table; see
    /// [`apply_discount_rules`](Self::apply_discount_rules).
    pub fn calculate_discount_percentage(&self) -> Decimal {
        match self.quantity {
            q if (TIER_ONE_MIN_QUANTITY..TIER_TWO_MIN_QUANTITY).contains(&q) => Decimal::TEN,
            q if (TIER_TWO_MIN_QUANTITY..=MAX_ITEM_QUANTITY).contains(&q) => Decimal::from(20),
            _ => Decimal::ZERO,
        }
    }

    /// Set the discount from the quantity tier and refresh the total
    pub fn apply_discount_rules(&mut self) -> Result<(), SaleError> {
        Self::check_quantity(self.quantity)?;

        self.discount_percentage = self.calculate_discount_percentage();
        self.total_amount = self.calculate_total();
        Ok(())
    }

    /// Total for this line after discount
    ///
    /// Formula: quantity × unit_price × (1 - discount_percentage / 100),
    /// or zero once the item is cancelled.
    pub fn calculate_total(&self) -> Decimal {
        if self.is_cancelled {
            return Decimal::ZERO;
        }

        self.gross_amount() - self.discount_amount()
    }

    /// quantity × unit_price, before discount
    pub fn gross_amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    /// Amount taken off the gross by the discount tier
    pub fn discount_amount(&self) -> Decimal {
        self.gross_amount() * (self.discount_percentage / Decimal::ONE_HUNDRED)
    }

    /// Mark the item cancelled
    ///
    /// Does not touch the owning sale's total; `Sale::cancel_item` handles that.
    pub fn cancel(&mut self) {
        self.is_cancelled = true;
        self.total_amount = Decimal::ZERO;
    }

    pub(super) fn attach_to(&mut self, sale_id: Uuid) {
        self.sale_id = sale_id;
    }

    /// Overwrite quantity and price, then re-apply the discount rules
    ///
    /// The quantity is checked first so a rejected update leaves the item
    /// untouched.
    pub(super) fn reprice(&mut self, quantity: i32, unit_price: Decimal) -> Result<(), SaleError> {
        Self::check_quantity(quantity)?;

        self.quantity = quantity;
        self.unit_price = unit_price;
        self.apply_discount_rules()
    }

    fn check_quantity(quantity: i32) -> Result<(), SaleError> {
        if quantity > MAX_ITEM_QUANTITY {
            return Err(SaleError::DiscountRuleViolation(format!(
                "It's not possible to sell above {} identical items, got: {}",
                MAX_ITEM_QUANTITY, quantity
            )));
        }

        Ok(())
    }
}
