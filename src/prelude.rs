//! fieldledger prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    config::{ConfigError, PaymentConfig, build_payment_config, parse_payment_config},
    discounts::{DiscountConfig, DiscountKind, DiscountRule},
    fixtures::{FixtureError, Quote},
    installments::{Installment, InstallmentStatus, generate_installments, schedule_total},
    money::{CurrencyError, parse_currency, round_to_currency, to_money},
    orders::{LineItem, subtotal},
    payments::{
        PAYMENT_TOLERANCE, PaymentMethodEntry, PaymentValidation, payments_total,
        validate_payment_methods,
    },
    report::{QuoteReport, ReportError},
    statements::{
        CreditCard, StatementError, StatementPeriod, calculate_statement_date,
        get_statement_period, statement_for_purchase,
    },
    totals::{CalculatedTotals, TotalsCache, compute_totals},
    trips::{GpsFix, PositionThrottle, Trip, TripTracker, haversine_m},
    webhook::{FINANCIALS_EVENT, WebhookContext, WebhookError, prepare_webhook_payload},
};
