//! Quote fixtures
//!
//! Service order quotes described in YAML, used by the CLI and by tests.
//!
//! ```yaml
//! order_id: OS-1042
//! currency: BRL
//! parts:
//!   - { description: Compressor, quantity: 1, unit_price: "1000.00" }
//! services:
//!   - { description: Installation, quantity: 2, unit_price: "250.00" }
//! discounts:
//!   parts: { type: percent, value: 10 }
//!   services: { type: fixed, value: 50 }
//!   total: { type: percent, value: 5 }
//! payment:
//!   start_date: "2024-01-01"
//!   installment_days: [30, 30, 30]
//!   methods:
//!     - { id: "1", method: pix, amount: "1282.50" }
//! ```

use std::{fs, path::Path, str::FromStr};

use jiff::civil::Date;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::PaymentConfig,
    discounts::DiscountConfig,
    installments::generate_installments,
    money::{CurrencyError, parse_currency},
    orders::{LineItem, subtotal},
    payments::{PaymentMethodEntry, validate_payment_methods},
    report::QuoteReport,
    totals::compute_totals,
};

/// Quote fixture parsing errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid amount format
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid date format
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Unknown currency code
    #[error(transparent)]
    Currency(#[from] CurrencyError),
}

/// Wrapper for a quote in YAML
#[derive(Debug, Deserialize)]
struct QuoteFixture {
    #[serde(default)]
    order_id: String,
    currency: String,
    #[serde(default)]
    parts: Vec<LineFixture>,
    #[serde(default)]
    services: Vec<LineFixture>,
    #[serde(default)]
    discounts: DiscountConfig,
    #[serde(default)]
    payment: PaymentFixture,
}

#[derive(Debug, Deserialize)]
struct LineFixture {
    description: String,
    #[serde(default = "one")]
    quantity: Decimal,
    unit_price: String,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentFixture {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    installment_days: Vec<i64>,
    #[serde(default)]
    methods: Vec<MethodFixture>,
}

#[derive(Debug, Deserialize)]
struct MethodFixture {
    #[serde(default)]
    id: String,
    method: String,
    amount: String,
}

fn one() -> Decimal {
    Decimal::ONE
}

/// A service order quote: what was billed, the discounts and the payment plan.
#[derive(Debug, Clone)]
pub struct Quote {
    /// Service order identifier
    pub order_id: String,

    /// Currency of every amount in the quote
    pub currency: &'static Currency,

    /// Parts billed
    pub parts: Vec<LineItem>,

    /// Services billed
    pub services: Vec<LineItem>,

    /// Discount tiers
    pub discounts: DiscountConfig,

    /// Payment plan
    pub payment: PaymentConfig,
}

impl Quote {
    /// Load a quote from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not describe a
    /// valid quote.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path.as_ref())?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a quote from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, the currency is unknown, or
    /// an amount or the start date cannot be parsed.
    pub fn from_yaml_str(s: &str) -> Result<Self, FixtureError> {
        let fixture: QuoteFixture = serde_norway::from_str(s)?;

        fixture.try_into()
    }

    /// Calculate totals, installments and payment reconciliation.
    ///
    /// Without a start date the installment schedule is empty.
    pub fn evaluate(&self) -> QuoteReport {
        let totals = compute_totals(
            subtotal(&self.parts),
            subtotal(&self.services),
            &self.discounts,
        );

        let installments = self
            .payment
            .start_date()
            .map(|start| {
                generate_installments(start, &self.payment.installment_days, totals.grand_total)
            })
            .unwrap_or_default();

        let validation =
            validate_payment_methods(&self.payment.payment_methods, totals.grand_total);

        debug!(
            order_id = %self.order_id,
            grand_total = %totals.grand_total,
            installments = installments.len(),
            valid = validation.valid,
            "evaluated quote"
        );

        QuoteReport {
            order_id: self.order_id.clone(),
            currency: self.currency,
            totals,
            installments,
            payment_methods: self.payment.payment_methods.clone(),
            validation,
        }
    }
}

impl TryFrom<QuoteFixture> for Quote {
    type Error = FixtureError;

    fn try_from(fixture: QuoteFixture) -> Result<Self, Self::Error> {
        let currency = parse_currency(&fixture.currency)?;

        let parts = fixture
            .parts
            .into_iter()
            .map(LineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let services = fixture
            .services
            .into_iter()
            .map(LineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let start_date = match fixture.payment.start_date {
            Some(raw) => {
                let date = raw
                    .trim()
                    .parse::<Date>()
                    .map_err(|_err| FixtureError::InvalidDate(raw.clone()))?;

                date.to_string()
            }
            None => String::new(),
        };

        let payment_methods = fixture
            .payment
            .methods
            .into_iter()
            .map(|method| {
                Ok(PaymentMethodEntry::new(
                    method.id,
                    method.method,
                    parse_amount(&method.amount)?,
                ))
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        Ok(Quote {
            order_id: fixture.order_id,
            currency,
            parts,
            services,
            discounts: fixture.discounts,
            payment: PaymentConfig {
                start_date,
                installment_days: fixture.payment.installment_days,
                payment_methods,
            },
        })
    }
}

impl TryFrom<LineFixture> for LineItem {
    type Error = FixtureError;

    fn try_from(fixture: LineFixture) -> Result<Self, Self::Error> {
        Ok(LineItem::new(
            fixture.description,
            fixture.quantity,
            parse_amount(&fixture.unit_price)?,
        ))
    }
}

/// Parse an amount string (e.g. `"1000.00"`) into a decimal.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidAmount`] if the string is not a number.
pub fn parse_amount(s: &str) -> Result<Decimal, FixtureError> {
    Decimal::from_str(s.trim()).map_err(|_err| FixtureError::InvalidAmount(s.to_string()))
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal_macros::dec;
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::discounts::DiscountRule;

    use super::*;

    const QUOTE: &str = r#"
order_id: OS-1042
currency: BRL
parts:
  - { description: Compressor, quantity: 1, unit_price: "1000.00" }
services:
  - { description: Installation, quantity: 2, unit_price: "250.00" }
discounts:
  parts: { type: percent, value: 10 }
  services: { type: fixed, value: 50 }
  total: { type: percent, value: 5 }
payment:
  start_date: "2024-01-01"
  installment_days: [30, 30, 30]
  methods:
    - { id: "1", method: pix, amount: "1000.00" }
    - { id: "2", method: cash, amount: "282.50" }
"#;

    #[test]
    fn parses_full_quote() -> TestResult {
        let quote = Quote::from_yaml_str(QUOTE)?;

        assert_eq!(quote.order_id, "OS-1042");
        assert_eq!(quote.currency, iso::BRL);
        assert_eq!(subtotal(&quote.parts), dec!(1000));
        assert_eq!(subtotal(&quote.services), dec!(500));
        assert_eq!(quote.discounts.services, DiscountRule::fixed(dec!(50)));
        assert_eq!(quote.payment.start_date(), Some(date(2024, 1, 1)));
        assert_eq!(quote.payment.payment_methods.len(), 2);

        Ok(())
    }

    #[test]
    fn evaluates_quote() -> TestResult {
        let report = Quote::from_yaml_str(QUOTE)?.evaluate();

        assert_eq!(report.totals.grand_total, dec!(1282.5));
        assert_eq!(report.installments.len(), 3);
        assert!(report.validation.valid);

        Ok(())
    }

    #[test]
    fn minimal_quote_defaults_everything() -> TestResult {
        let quote = Quote::from_yaml_str("currency: USD\n")?;
        let report = quote.evaluate();

        assert_eq!(report.totals.grand_total, Decimal::ZERO);
        assert!(report.installments.is_empty());
        assert!(report.validation.valid);

        Ok(())
    }

    #[test]
    fn quantity_defaults_to_one() -> TestResult {
        let quote = Quote::from_yaml_str(
            "currency: BRL\nparts:\n  - { description: Filter, unit_price: \"35.50\" }\n",
        )?;

        assert_eq!(subtotal(&quote.parts), dec!(35.50));

        Ok(())
    }

    #[test]
    fn oversized_prices_evaluate_without_panicking() -> TestResult {
        let quote = Quote::from_yaml_str(
            r#"
currency: BRL
parts:
  - { description: Compressor, quantity: 2, unit_price: "79228162514264337593543950335" }
payment:
  methods:
    - { method: pix, amount: "79228162514264337593543950335" }
"#,
        )?;

        let report = quote.evaluate();

        assert_eq!(report.totals.subtotal_parts, Decimal::MAX);
        assert_eq!(report.totals.grand_total, Decimal::MAX);
        assert!(report.validation.valid);

        Ok(())
    }

    #[test]
    fn rejects_unknown_currency() {
        assert!(matches!(
            Quote::from_yaml_str("currency: ABC\n"),
            Err(FixtureError::Currency(CurrencyError::UnknownCurrency(code))) if code == "ABC"
        ));
    }

    #[test]
    fn rejects_bad_amounts_and_dates() {
        assert!(matches!(
            Quote::from_yaml_str(
                "currency: BRL\nparts:\n  - { description: Filter, unit_price: \"cheap\" }\n"
            ),
            Err(FixtureError::InvalidAmount(amount)) if amount == "cheap"
        ));
        assert!(matches!(
            Quote::from_yaml_str("currency: BRL\npayment:\n  start_date: \"01/02/2024\"\n"),
            Err(FixtureError::InvalidDate(_))
        ));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            Quote::from_yaml_str("currency: [BRL"),
            Err(FixtureError::Yaml(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Quote::from_path("./does-not-exist/quote.yml"),
            Err(FixtureError::Io(_))
        ));
    }
}
