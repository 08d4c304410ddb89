/// Failures raised by the sale aggregate
///
/// The aggregate never recovers from these itself; every violated rule is
/// returned to the caller as-is. Retrying without changing the input
/// reproduces the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaleError {
    /// Operation is not permitted in the sale's or item's current status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Referenced item does not exist in the sale
    #[error("Not found: {0}")]
    NotFound(String),

    /// Line item quantity exceeds the per-item maximum
    #[error("Discount rule violation: {0}")]
    DiscountRuleViolation(String),
}

impl SaleError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        SaleError::InvalidState(msg.into())
    }

    pub fn item_not_found(item_id: uuid::Uuid) -> Self {
        SaleError::NotFound(format!("Item with ID {} not found in this sale", item_id))
    }
}
