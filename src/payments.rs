//! Payments

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::money::{sub_amounts, sum_amounts};

/// Largest difference between declared payments and the order total that still
/// reconciles (one cent).
pub const PAYMENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One declared way of paying part of an order (cash, card, transfer, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentMethodEntry {
    /// Caller-assigned identifier
    pub id: String,

    /// Payment method name
    pub method: String,

    /// Amount paid with this method
    pub amount: Decimal,

    /// Method-specific details (card brand, installments, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl PaymentMethodEntry {
    /// Create an entry without details.
    pub fn new(id: impl Into<String>, method: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            amount,
            details: None,
        }
    }
}

/// Outcome of reconciling declared payments against a total.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentValidation {
    /// Whether the payments cover the total within [`PAYMENT_TOLERANCE`]
    pub valid: bool,

    /// `total` minus the sum of payments; positive when underpaid
    pub diff: Decimal,
}

/// Sum of every declared payment amount.
pub fn payments_total(methods: &[PaymentMethodEntry]) -> Decimal {
    sum_amounts(methods.iter().map(|entry| entry.amount))
}

/// Check that declared payment amounts add up to `total`.
pub fn validate_payment_methods(
    methods: &[PaymentMethodEntry],
    total: Decimal,
) -> PaymentValidation {
    let diff = sub_amounts(total, payments_total(methods));
    let valid = diff.abs() < PAYMENT_TOLERANCE;

    debug!(methods = methods.len(), %total, %diff, valid, "validated payment methods");

    PaymentValidation { valid, diff }
}
