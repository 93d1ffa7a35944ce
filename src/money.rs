//! Currency helpers
//!
//! Calculations run on plain [`Decimal`] amounts; currencies only come into
//! play when amounts leave the crate and have to be rounded to minor units.
//!
//! Amount arithmetic saturates at the bounds of [`Decimal`] and logs a warning
//! instead of panicking, so the calculators stay total for any input.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;
use tracing::warn;

/// Errors raised while converting amounts into a currency.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    /// The currency code is not one this crate handles.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// The amount does not fit in `i64` minor units.
    #[error("amount {0} cannot be represented in minor units")]
    AmountOutOfRange(Decimal),
}

/// Look up a supported ISO currency by its alpha code.
///
/// # Errors
///
/// Returns [`CurrencyError::UnknownCurrency`] for unsupported codes.
pub fn parse_currency(code: &str) -> Result<&'static Currency, CurrencyError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "BRL" => Ok(iso::BRL),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        "GBP" => Ok(iso::GBP),
        other => Err(CurrencyError::UnknownCurrency(other.to_string())),
    }
}

/// Round an amount to the currency's minor unit, half away from zero.
///
/// The result always carries exactly the currency's number of decimal places,
/// so `1282.5` in BRL becomes `1282.50`.
pub fn round_to_currency(amount: Decimal, currency: &Currency) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero);

    rounded.rescale(currency.exponent);

    rounded
}

/// Convert an amount into [`Money`], rounding to the currency's minor unit.
///
/// # Errors
///
/// Returns [`CurrencyError::AmountOutOfRange`] if the minor-unit value does not
/// fit in an `i64`.
pub fn to_money(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, CurrencyError> {
    let rounded = round_to_currency(amount, currency);

    let minor = rounded
        .mantissa()
        .to_i64()
        .ok_or(CurrencyError::AmountOutOfRange(amount))?;

    Ok(Money::from_minor(minor, currency))
}

/// `a + b`, saturating on overflow.
pub fn add_amounts(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        warn!(%a, %b, "amount addition overflowed, saturating");

        a.saturating_add(b)
    })
}

/// `a - b`, saturating on overflow.
pub fn sub_amounts(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or_else(|| {
        warn!(%a, %b, "amount subtraction overflowed, saturating");

        a.saturating_sub(b)
    })
}

/// `a * b`, saturating on overflow.
pub fn mul_amounts(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        warn!(%a, %b, "amount multiplication overflowed, saturating");

        a.saturating_mul(b)
    })
}

/// Sum of `amounts`, saturating on overflow; zero when empty.
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, add_amounts)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_currency_accepts_supported_codes() -> TestResult {
        assert_eq!(parse_currency("BRL")?, iso::BRL);
        assert_eq!(parse_currency(" usd ")?, iso::USD);
        assert_eq!(parse_currency("EUR")?, iso::EUR);
        assert_eq!(parse_currency("GBP")?, iso::GBP);

        Ok(())
    }

    #[test]
    fn parse_currency_rejects_unknown_codes() {
        assert_eq!(
            parse_currency("ABC"),
            Err(CurrencyError::UnknownCurrency("ABC".to_string()))
        );
    }

    #[test]
    fn rounds_half_away_from_zero_with_fixed_scale() {
        assert_eq!(round_to_currency(dec!(1282.5), iso::BRL).to_string(), "1282.50");
        assert_eq!(round_to_currency(dec!(33.335), iso::BRL).to_string(), "33.34");
        assert_eq!(round_to_currency(dec!(-0.005), iso::BRL).to_string(), "-0.01");
    }

    #[test]
    fn to_money_uses_minor_units() -> TestResult {
        let money = to_money(dec!(12.345), iso::BRL)?;

        assert_eq!(money, Money::from_minor(1235, iso::BRL));

        Ok(())
    }

    #[test]
    fn amount_arithmetic_saturates_instead_of_overflowing() {
        assert_eq!(add_amounts(Decimal::MAX, Decimal::ONE), Decimal::MAX);
        assert_eq!(sub_amounts(Decimal::MIN, Decimal::ONE), Decimal::MIN);
        assert_eq!(mul_amounts(Decimal::MAX, dec!(-2)), Decimal::MIN);
        assert_eq!(sum_amounts([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
    }

    #[test]
    fn amount_arithmetic_is_exact_in_range() {
        assert_eq!(add_amounts(dec!(0.1), dec!(0.2)), dec!(0.3));
        assert_eq!(sub_amounts(dec!(1350), dec!(67.5)), dec!(1282.5));
        assert_eq!(mul_amounts(dec!(2), dec!(45.90)), dec!(91.80));
        assert_eq!(sum_amounts([]), Decimal::ZERO);
    }

    #[test]
    fn to_money_rejects_amounts_beyond_i64() {
        let huge = Decimal::MAX;

        assert_eq!(
            to_money(huge, iso::BRL),
            Err(CurrencyError::AmountOutOfRange(huge))
        );
    }
}
