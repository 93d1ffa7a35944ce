//! Service order lines

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{mul_amounts, sum_amounts};

/// A part or service billed on a service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What was supplied or done
    pub description: String,

    /// Units supplied (hours for services)
    pub quantity: Decimal,

    /// Price per unit
    pub unit_price: Decimal,
}

impl LineItem {
    /// Create a line item.
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// Quantity times unit price, saturating on overflow.
    pub fn total(&self) -> Decimal {
        mul_amounts(self.quantity, self.unit_price)
    }
}

/// Sum of every line total; zero for no lines.
pub fn subtotal(lines: &[LineItem]) -> Decimal {
    sum_amounts(lines.iter().map(LineItem::total))
}
