//! fieldledger
//!
//! Financial calculations for field-service orders: discount tiers and totals,
//! installment schedules, payment reconciliation, credit-card statement dates
//! and vehicle trip tracking. Everything here is a plain calculation over its
//! inputs; storage, delivery and presentation belong to the caller.

pub mod config;
pub mod discounts;
pub mod fixtures;
pub mod installments;
pub mod money;
pub mod orders;
pub mod payments;
pub mod prelude;
pub mod report;
pub mod statements;
pub mod totals;
pub mod trips;
pub mod webhook;
