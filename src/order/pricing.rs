//! Order pricing.
//!
//! Plain `f64` arithmetic in a fixed evaluation order, with no rounding:
//! totals must match the other services' figures exactly.

use crate::collaborators::CartItem;
use crate::error::SagaError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pricing {
    /// Sum of `unit_price * quantity`, before discounts.
    pub total_price: f64,
    /// Sum of discounted line totals.
    pub grand_total: f64,
}

/// `unit_price * quantity`.
pub fn line_total(item: &CartItem) -> f64 {
    item.unit_price * f64::from(item.quantity)
}

/// Line total after the item's percentage discount.
pub fn discounted_line_total(item: &CartItem) -> f64 {
    let gross = line_total(item);
    if item.discount_pct == 0 {
        gross
    } else {
        gross - (gross * f64::from(item.discount_pct)) / 100.0
    }
}

/// Reject lines that would break `grand_total <= total_price`.
pub fn validate_item(item: &CartItem) -> Result<(), SagaError> {
    if item.discount_pct > 100 {
        return Err(SagaError::Validation(format!(
            "product {} has discount {}%, expected 0-100",
            item.product_id, item.discount_pct
        )));
    }
    if item.quantity == 0 {
        return Err(SagaError::Validation(format!(
            "product {} has zero quantity",
            item.product_id
        )));
    }
    if !item.unit_price.is_finite() || item.unit_price < 0.0 {
        return Err(SagaError::Validation(format!(
            "product {} has invalid price {}",
            item.product_id, item.unit_price
        )));
    }
    Ok(())
}

pub fn price_cart(items: &[CartItem]) -> Pricing {
    let mut pricing = Pricing {
        total_price: 0.0,
        grand_total: 0.0,
    };
    for item in items {
        pricing.total_price += line_total(item);
        pricing.grand_total += discounted_line_total(item);
    }
    pricing
}
