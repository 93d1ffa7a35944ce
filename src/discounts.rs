//! Discounts

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::mul_amounts;

/// How a [`DiscountRule`] value is interpreted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// The value is a percentage in points (e.g. `10` for "10% off").
    #[default]
    Percent,

    /// The value is a fixed currency amount (e.g. `50` for "50.00 off").
    Fixed,
}

/// A single discount tier.
///
/// `value` is expected to be non-negative. Percentages are not clamped, so a
/// value above `100` discounts more than the amount it is applied to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DiscountRule {
    /// Percent or fixed amount
    #[serde(rename = "type")]
    pub kind: DiscountKind,

    /// Percentage points or currency amount, depending on `kind`
    pub value: Decimal,
}

impl DiscountRule {
    /// Percentage discount, in points.
    pub fn percent(value: Decimal) -> Self {
        Self {
            kind: DiscountKind::Percent,
            value,
        }
    }

    /// Fixed amount discount.
    pub fn fixed(value: Decimal) -> Self {
        Self {
            kind: DiscountKind::Fixed,
            value,
        }
    }

    /// A rule that never discounts anything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Calculate the amount this rule takes off `base`.
    ///
    /// Fixed amounts never exceed `base`; percentages are applied as-is.
    pub fn amount_off(&self, base: Decimal) -> Decimal {
        match self.kind {
            DiscountKind::Percent => match base.checked_mul(self.value) {
                Some(scaled) => scaled / Decimal::ONE_HUNDRED,
                None => mul_amounts(base / Decimal::ONE_HUNDRED, self.value),
            },
            DiscountKind::Fixed => self.value.min(base),
        }
    }

    /// The same rule with trailing zeros stripped from its value.
    #[must_use]
    pub fn normalize(&self) -> Self {
        Self {
            kind: self.kind,
            value: self.value.normalize(),
        }
    }

    /// Whether the rule discounts nothing regardless of the base.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl fmt::Display for DiscountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiscountKind::Percent => write!(f, "{}%", self.value.normalize()),
            DiscountKind::Fixed => write!(f, "{}", self.value.normalize()),
        }
    }
}

/// The three discount tiers of a service order.
///
/// Category tiers (`parts`, `services`) are applied first, then `total` is
/// applied to what remains.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountConfig {
    /// Discount on parts
    pub parts: DiscountRule,

    /// Discount on services
    pub services: DiscountRule,

    /// Whole-order discount, applied after the category discounts
    pub total: DiscountRule,
}

impl DiscountConfig {
    /// Create a discount configuration from its three tiers.
    pub fn new(parts: DiscountRule, services: DiscountRule, total: DiscountRule) -> Self {
        Self {
            parts,
            services,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_is_applied_in_points() {
        let rule = DiscountRule::percent(dec!(10));

        assert_eq!(rule.amount_off(dec!(1000)), dec!(100));
    }

    #[test]
    fn fixed_is_clamped_to_base() {
        let rule = DiscountRule::fixed(dec!(80));

        assert_eq!(rule.amount_off(dec!(50)), dec!(50));
        assert_eq!(rule.amount_off(dec!(500)), dec!(80));
    }

    #[test]
    fn percent_above_one_hundred_is_not_clamped() {
        let rule = DiscountRule::percent(dec!(150));

        assert_eq!(rule.amount_off(dec!(200)), dec!(300));
    }

    #[test]
    fn percent_of_huge_base_does_not_overflow() {
        let whole = DiscountRule::percent(dec!(100)).amount_off(Decimal::MAX);

        assert!((Decimal::MAX - whole) < Decimal::ONE, "got {whole}");
        assert_eq!(
            DiscountRule::percent(dec!(300)).amount_off(Decimal::MAX),
            Decimal::MAX
        );
    }

    #[test]
    fn zero_value_discounts_nothing() {
        assert_eq!(DiscountRule::percent(Decimal::ZERO).amount_off(dec!(99)), Decimal::ZERO);
        assert_eq!(DiscountRule::fixed(Decimal::ZERO).amount_off(dec!(99)), Decimal::ZERO);
        assert!(DiscountRule::none().is_zero());
    }

    #[test]
    fn normalize_strips_trailing_zeros() {
        let rule = DiscountRule::fixed(dec!(50.00)).normalize();

        assert_eq!(rule.value.to_string(), "50");
        assert_eq!(rule.kind, DiscountKind::Fixed);
    }

    #[test]
    fn display_formats_by_kind() {
        assert_eq!(DiscountRule::percent(dec!(12.50)).to_string(), "12.5%");
        assert_eq!(DiscountRule::fixed(dec!(50.00)).to_string(), "50");
    }

    #[test]
    fn config_deserializes_type_tag_and_defaults_missing_tiers() -> TestResult {
        let config: DiscountConfig = serde_json::from_str(
            r#"{"parts": {"type": "percent", "value": 10}, "services": {"type": "fixed", "value": "50"}}"#,
        )?;

        assert_eq!(config.parts, DiscountRule::percent(dec!(10)));
        assert_eq!(config.services, DiscountRule::fixed(dec!(50)));
        assert_eq!(config.total, DiscountRule::none());

        Ok(())
    }
}
