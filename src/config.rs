//! Payment configuration codec
//!
//! Service orders persist their payment plan as a loosely typed JSON object.
//! Parsing is lenient: anything missing or of the wrong shape falls back to an
//! empty value instead of failing.

use std::str::FromStr;

use jiff::civil::Date;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde_json::{Map, Number, Value, json};
use thiserror::Error;

use crate::payments::PaymentMethodEntry;

/// Errors that can occur when reading a payment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not JSON at all.
    #[error("payment configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted payment plan of a service order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaymentConfig {
    /// First installment reference date (ISO `YYYY-MM-DD`), or empty
    pub start_date: String,

    /// Day offsets between consecutive installments
    pub installment_days: Vec<i64>,

    /// Declared payment methods
    pub payment_methods: Vec<PaymentMethodEntry>,
}

impl PaymentConfig {
    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if `s` is not valid JSON. Valid JSON of
    /// any shape is accepted.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(s)?;

        Ok(parse_payment_config(Some(&value)))
    }

    /// The start date, if it is a valid ISO date.
    pub fn start_date(&self) -> Option<Date> {
        self.start_date.trim().parse().ok()
    }

    /// Serialize back into the persisted JSON shape.
    pub fn to_value(&self) -> Value {
        build_payment_config(self)
    }
}

/// Coerce a persisted JSON value into a [`PaymentConfig`].
///
/// `None`, `null` and non-object values give the default configuration.
/// Both `camelCase` and `snake_case` keys are recognised.
pub fn parse_payment_config(value: Option<&Value>) -> PaymentConfig {
    let Some(Value::Object(object)) = value else {
        return PaymentConfig::default();
    };

    let start_date = field(object, "startDate", "start_date")
        .and_then(coerce_string)
        .unwrap_or_default();

    let installment_days = field(object, "installmentDays", "installment_days")
        .and_then(Value::as_array)
        .map(|days| days.iter().filter_map(coerce_days).collect())
        .unwrap_or_default();

    let payment_methods = field(object, "paymentMethods", "payment_methods")
        .and_then(Value::as_array)
        .map(|methods| methods.iter().filter_map(coerce_payment_method).collect())
        .unwrap_or_default();

    PaymentConfig {
        start_date,
        installment_days,
        payment_methods,
    }
}

/// Build the persisted JSON shape of a [`PaymentConfig`].
///
/// Keys are `camelCase` and amounts are JSON numbers.
pub fn build_payment_config(config: &PaymentConfig) -> Value {
    let payment_methods: Vec<Value> = config
        .payment_methods
        .iter()
        .map(|entry| {
            let mut method = Map::new();

            method.insert("id".to_string(), Value::String(entry.id.clone()));
            method.insert("method".to_string(), Value::String(entry.method.clone()));
            method.insert("amount".to_string(), decimal_to_number(entry.amount));

            if let Some(details) = &entry.details {
                method.insert("details".to_string(), Value::Object(details.clone()));
            }

            Value::Object(method)
        })
        .collect();

    json!({
        "startDate": config.start_date,
        "installmentDays": config.installment_days,
        "paymentMethods": payment_methods,
    })
}

fn field<'a>(object: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    object
        .get(camel)
        .or_else(|| object.get(snake))
        .filter(|value| !value.is_null())
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_days(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64)),
        Value::String(s) => {
            let s = s.trim();

            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_f64))
        }
        _ => None,
    }
}

fn truncate_f64(value: f64) -> Option<i64> {
    Decimal::from_f64_retain(value)?.trunc().to_i64()
}

fn coerce_amount(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain))
            .unwrap_or_default(),
        Value::String(s) => Decimal::from_str(s.trim()).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

fn coerce_payment_method(value: &Value) -> Option<PaymentMethodEntry> {
    let Value::Object(object) = value else {
        return None;
    };

    Some(PaymentMethodEntry {
        id: object.get("id").and_then(coerce_string).unwrap_or_default(),
        method: object
            .get("method")
            .and_then(coerce_string)
            .unwrap_or_default(),
        amount: object.get("amount").map(coerce_amount).unwrap_or_default(),
        details: object.get("details").and_then(Value::as_object).cloned(),
    })
}

fn decimal_to_number(amount: Decimal) -> Value {
    match amount.to_i64() {
        Some(whole) if amount.fract().is_zero() => Value::from(whole),
        _ => amount
            .to_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_camel_case_document() -> TestResult {
        let config = PaymentConfig::from_json_str(
            r#"{
                "startDate": "2024-01-01",
                "installmentDays": [30, 30, 30],
                "paymentMethods": [
                    {"id": "a1", "method": "pix", "amount": 150.5},
                    {"id": 2, "method": "credit_card", "amount": "149.50", "details": {"brand": "visa"}}
                ]
            }"#,
        )?;

        assert_eq!(config.start_date(), Some(date(2024, 1, 1)));
        assert_eq!(config.installment_days, vec![30, 30, 30]);
        assert_eq!(config.payment_methods.len(), 2);

        let second = config.payment_methods.get(1).ok_or("missing second method")?;

        assert_eq!(second.id, "2");
        assert_eq!(second.amount, dec!(149.50));
        assert!(second.details.is_some());
        assert_eq!(
            config.payment_methods.first().map(|m| m.amount),
            Some(dec!(150.5))
        );

        Ok(())
    }

    #[test]
    fn accepts_snake_case_keys() {
        let value = json!({"start_date": "2024-02-10", "installment_days": [15]});
        let config = parse_payment_config(Some(&value));

        assert_eq!(config.start_date, "2024-02-10");
        assert_eq!(config.installment_days, vec![15]);
    }

    #[test]
    fn missing_or_mistyped_fields_default_to_empty() {
        let value = json!({"startDate": null, "installmentDays": "30", "paymentMethods": {}});
        let config = parse_payment_config(Some(&value));

        assert_eq!(config, PaymentConfig::default());
        assert_eq!(parse_payment_config(None), PaymentConfig::default());
        assert_eq!(parse_payment_config(Some(&json!([1, 2]))), PaymentConfig::default());
    }

    #[test]
    fn installment_days_are_coerced() {
        let value = json!({"installmentDays": [30, "45", 10.9, "x", null, true]});
        let config = parse_payment_config(Some(&value));

        assert_eq!(config.installment_days, vec![30, 45, 10]);
    }

    #[test]
    fn bad_amounts_become_zero_and_non_objects_are_skipped() {
        let value = json!({"paymentMethods": [{"method": "cash", "amount": "lots"}, "cash", 3]});
        let config = parse_payment_config(Some(&value));

        assert_eq!(
            config.payment_methods,
            vec![PaymentMethodEntry::new("", "cash", Decimal::ZERO)]
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            PaymentConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn invalid_start_date_is_none() {
        let config = PaymentConfig {
            start_date: "31/01/2024".to_string(),
            ..PaymentConfig::default()
        };

        assert_eq!(config.start_date(), None);
    }

    #[test]
    fn build_then_parse_preserves_the_plan() {
        let config = PaymentConfig {
            start_date: "2024-01-01".to_string(),
            installment_days: vec![0, 30],
            payment_methods: vec![
                PaymentMethodEntry::new("1", "pix", dec!(100)),
                PaymentMethodEntry::new("2", "boleto", dec!(99.9)),
            ],
        };

        let value = build_payment_config(&config);

        assert_eq!(value["installmentDays"], json!([0, 30]));
        assert_eq!(value["paymentMethods"][0]["amount"], json!(100));
        assert_eq!(value["paymentMethods"][1]["amount"], json!(99.9));
        assert_eq!(parse_payment_config(Some(&value)), config);
        assert_eq!(config.to_value(), value);
    }
}
