//! Totals
//!
//! Applies the three discount tiers of a [`DiscountConfig`] to the parts and
//! services subtotals of a service order.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::{
    discounts::DiscountConfig,
    money::{add_amounts, sub_amounts, sum_amounts},
};

/// Discounted totals for a service order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CalculatedTotals {
    /// Parts total before discounts
    pub subtotal_parts: Decimal,

    /// Services total before discounts
    pub subtotal_services: Decimal,

    /// Amount taken off the parts subtotal
    pub discount_parts: Decimal,

    /// Amount taken off the services subtotal
    pub discount_services: Decimal,

    /// Whole-order discount, taken off after the category discounts
    pub discount_total: Decimal,

    /// Parts total after the parts discount
    pub total_parts: Decimal,

    /// Services total after the services discount
    pub total_services: Decimal,

    /// Amount payable
    pub grand_total: Decimal,
}

impl CalculatedTotals {
    /// Parts and services before any discount.
    pub fn subtotal(&self) -> Decimal {
        add_amounts(self.subtotal_parts, self.subtotal_services)
    }

    /// Parts and services after their category discounts, before the
    /// whole-order discount.
    pub fn subtotal_after_categories(&self) -> Decimal {
        add_amounts(self.total_parts, self.total_services)
    }

    /// Sum of every discount tier.
    pub fn total_discount(&self) -> Decimal {
        sum_amounts([
            self.discount_parts,
            self.discount_services,
            self.discount_total,
        ])
    }
}

/// Calculate discounted totals from the parts and services subtotals.
///
/// Subtotals are expected to be non-negative; they are not validated here.
/// Fixed discounts are clamped to the amount they reduce, percentages are not
/// clamped at all, so a category percentage above `100` yields a negative
/// category total.
pub fn compute_totals(
    subtotal_parts: Decimal,
    subtotal_services: Decimal,
    discounts: &DiscountConfig,
) -> CalculatedTotals {
    let discount_parts = discounts.parts.amount_off(subtotal_parts);
    let total_parts = sub_amounts(subtotal_parts, discount_parts);

    let discount_services = discounts.services.amount_off(subtotal_services);
    let total_services = sub_amounts(subtotal_services, discount_services);

    let subtotal_after_categories = add_amounts(total_parts, total_services);

    let discount_total = discounts.total.amount_off(subtotal_after_categories);
    let grand_total = sub_amounts(subtotal_after_categories, discount_total);

    debug!(
        %subtotal_parts,
        %subtotal_services,
        %discount_parts,
        %discount_services,
        %discount_total,
        %grand_total,
        "computed totals"
    );

    CalculatedTotals {
        subtotal_parts,
        subtotal_services,
        discount_parts,
        discount_services,
        discount_total,
        total_parts,
        total_services,
        grand_total,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TotalsKey {
    subtotal_parts: Decimal,
    subtotal_services: Decimal,
    discounts: DiscountConfig,
}

/// Memoizes [`compute_totals`] by its full input.
///
/// Callers that recompute totals on every change of an order form can route
/// through the cache and skip repeated work for inputs seen before.
#[derive(Debug, Default)]
pub struct TotalsCache {
    entries: FxHashMap<TotalsKey, CalculatedTotals>,
}

impl TotalsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached totals for these inputs, computing them on a miss.
    ///
    /// Inputs are normalized first, so `1000` and `1000.00` share an entry and
    /// the returned amounts carry the normalized scale.
    pub fn get_or_compute(
        &mut self,
        subtotal_parts: Decimal,
        subtotal_services: Decimal,
        discounts: &DiscountConfig,
    ) -> CalculatedTotals {
        let key = TotalsKey {
            subtotal_parts: subtotal_parts.normalize(),
            subtotal_services: subtotal_services.normalize(),
            discounts: DiscountConfig::new(
                discounts.parts.normalize(),
                discounts.services.normalize(),
                discounts.total.normalize(),
            ),
        };

        *self.entries.entry(key).or_insert_with(|| {
            compute_totals(key.subtotal_parts, key.subtotal_services, &key.discounts)
        })
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no results.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached result.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
