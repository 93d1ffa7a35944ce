//! Installments
//!
//! Splits an order total into equal installments whose due dates step
//! forward cumulatively from a start date.

use std::fmt;

use jiff::{Span, civil::Date};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::money::sum_amounts;

/// Lifecycle of a single installment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstallmentStatus {
    /// Not yet paid
    #[default]
    Open,

    /// Settled
    Paid,

    /// Past its due date and still unpaid
    Overdue,

    /// Withdrawn from the schedule
    Cancelled,
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallmentStatus::Open => "OPEN",
            InstallmentStatus::Paid => "PAID",
            InstallmentStatus::Overdue => "OVERDUE",
            InstallmentStatus::Cancelled => "CANCELLED",
        };

        f.write_str(label)
    }
}

/// One scheduled partial payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Position in the schedule, starting at 1
    pub number: u32,

    /// Days after the previous installment (or the start date, for the first)
    pub days: i64,

    /// Date the installment falls due
    pub due_date: Date,

    /// Amount due
    pub amount: Decimal,

    /// Payment status
    pub status: InstallmentStatus,

    /// Set once a caller changes the generated values
    pub is_edited: bool,
}

/// Generate an equal-value installment schedule.
///
/// Each offset in `installment_days` is relative to the previous due date, so
/// `[30, 30]` from January 1st falls due on January 31st and March 1st.
///
/// Returns an empty schedule when there are no offsets or `total` is not
/// positive. Amounts are `total / n` with no remainder correction, and offsets
/// are not checked for sign. If a due date would leave the supported calendar
/// range the schedule stops at the last representable installment.
pub fn generate_installments(
    start_date: Date,
    installment_days: &[i64],
    total: Decimal,
) -> Vec<Installment> {
    if installment_days.is_empty() || total <= Decimal::ZERO {
        debug!(
            count = installment_days.len(),
            %total,
            "nothing to schedule"
        );

        return Vec::new();
    }

    let amount = total / Decimal::from(installment_days.len());

    let mut installments = Vec::with_capacity(installment_days.len());
    let mut current = start_date;

    for (number, &days) in (1u32..).zip(installment_days) {
        let Some(next) = step(current, days) else {
            warn!(
                number,
                days,
                %current,
                "installment due date out of range; truncating schedule"
            );

            break;
        };

        current = next;

        installments.push(Installment {
            number,
            days,
            due_date: current,
            amount,
            status: InstallmentStatus::Open,
            is_edited: false,
        });
    }

    debug!(
        count = installments.len(),
        %total,
        %amount,
        "generated installments"
    );

    installments
}

/// Sum of every installment amount in a schedule.
pub fn schedule_total(installments: &[Installment]) -> Decimal {
    sum_amounts(installments.iter().map(|installment| installment.amount))
}

fn step(date: Date, days: i64) -> Option<Date> {
    let span = Span::new().try_days(days).ok()?;

    date.checked_add(span).ok()
}
