//! Webhook payloads
//!
//! Shapes the financial summary of a service order into the JSON document
//! posted to external systems. Delivery is the caller's job.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::{
    installments::Installment,
    money::{CurrencyError, round_to_currency, to_money},
    payments::{PaymentMethodEntry, validate_payment_methods},
    totals::CalculatedTotals,
};

/// Default event name for financial summaries.
pub const FINANCIALS_EVENT: &str = "service_order.financials";

/// Errors that can occur while building a webhook payload.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// An amount could not be expressed in the payload currency.
    #[error(transparent)]
    Currency(#[from] CurrencyError),
}

/// Envelope data for a webhook payload.
#[derive(Debug, Clone)]
pub struct WebhookContext {
    /// Event name
    pub event: String,

    /// Service order the payload describes
    pub order_id: String,

    /// Currency every amount is expressed in
    pub currency: &'static Currency,

    /// Payload creation time
    pub generated_at: Timestamp,
}

impl WebhookContext {
    /// Context for a [`FINANCIALS_EVENT`] generated now.
    pub fn financials(order_id: impl Into<String>, currency: &'static Currency) -> Self {
        Self {
            event: FINANCIALS_EVENT.to_string(),
            order_id: order_id.into(),
            currency,
            generated_at: Timestamp::now(),
        }
    }
}

/// Build the webhook document for an order's totals, schedule and payments.
///
/// Amounts are rendered as strings rounded to the currency's minor unit.
/// Payments are reconciled against the grand total.
///
/// # Errors
///
/// Returns [`WebhookError::Currency`] if the grand total cannot be represented
/// in minor units of the context currency.
pub fn prepare_webhook_payload(
    context: &WebhookContext,
    totals: &CalculatedTotals,
    installments: &[Installment],
    payment_methods: &[PaymentMethodEntry],
) -> Result<Value, WebhookError> {
    let currency = context.currency;
    let amount = |value: Decimal| Value::String(round_to_currency(value, currency).to_string());

    let grand_total = to_money(totals.grand_total, currency)?;

    let installments: Vec<Value> = installments
        .iter()
        .map(|installment| {
            json!({
                "number": installment.number,
                "days": installment.days,
                "due_date": installment.due_date.to_string(),
                "amount": amount(installment.amount),
                "status": installment.status.to_string(),
                "is_edited": installment.is_edited,
            })
        })
        .collect();

    let methods: Vec<Value> = payment_methods
        .iter()
        .map(|entry| {
            let mut method = Map::new();

            method.insert("id".to_string(), Value::String(entry.id.clone()));
            method.insert("method".to_string(), Value::String(entry.method.clone()));
            method.insert("amount".to_string(), amount(entry.amount));

            if let Some(details) = &entry.details {
                method.insert("details".to_string(), Value::Object(details.clone()));
            }

            Value::Object(method)
        })
        .collect();

    let validation = validate_payment_methods(payment_methods, totals.grand_total);

    Ok(json!({
        "event": context.event,
        "order_id": context.order_id,
        "generated_at": context.generated_at.to_string(),
        "currency": currency.iso_alpha_code,
        "totals": {
            "subtotal_parts": amount(totals.subtotal_parts),
            "subtotal_services": amount(totals.subtotal_services),
            "discount_parts": amount(totals.discount_parts),
            "discount_services": amount(totals.discount_services),
            "discount_total": amount(totals.discount_total),
            "total_parts": amount(totals.total_parts),
            "total_services": amount(totals.total_services),
            "grand_total": amount(totals.grand_total),
            "formatted": {
                "grand_total": grand_total.to_string(),
            },
        },
        "installments": installments,
        "payment_methods": methods,
        "payment_validation": {
            "valid": validation.valid,
            "diff": amount(validation.diff),
        },
    }))
}
