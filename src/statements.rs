//! Credit-card statements
//!
//! Works out which statement a card purchase lands on. A statement closes on
//! the card's closing day; purchases made on or after that day roll into the
//! next month's statement. Days past the end of a short month clamp to its
//! last day.

use jiff::{Span, civil::Date};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when working out statement dates.
#[derive(Debug, Error)]
pub enum StatementError {
    /// A closing or due day outside `1..=31`.
    #[error("{field} must be between 1 and 31, got {day}")]
    InvalidDay {
        /// Which day was rejected
        field: &'static str,

        /// The rejected value
        day: u8,
    },

    /// Calendar arithmetic left the supported date range.
    #[error(transparent)]
    Date(#[from] jiff::Error),
}

/// Billing cycle of a credit card.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CreditCard {
    closing_day: u8,
    due_day: u8,
}

impl CreditCard {
    /// Create a card billing cycle.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::InvalidDay`] if either day is outside `1..=31`.
    pub fn new(closing_day: u8, due_day: u8) -> Result<Self, StatementError> {
        validate_day("closing_day", closing_day)?;
        validate_day("due_day", due_day)?;

        Ok(Self {
            closing_day,
            due_day,
        })
    }

    /// Day of the month statements close.
    pub fn closing_day(&self) -> u8 {
        self.closing_day
    }

    /// Day of the month statements fall due.
    pub fn due_day(&self) -> u8 {
        self.due_day
    }

    /// Due date of a statement closing on `closing_date`.
    ///
    /// Due days after the closing day fall in the same month, anything else in
    /// the month after.
    fn due_date_for(&self, closing_date: Date) -> Result<Date, StatementError> {
        let month = if self.due_day > self.closing_day {
            closing_date.first_of_month()
        } else {
            add_months(closing_date.first_of_month(), 1)?
        };

        day_in_month(month, self.due_day)
    }
}

/// A single statement: the purchases it covers and its key dates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct StatementPeriod {
    /// First purchase date included (the previous closing date)
    pub start: Date,

    /// Last purchase date included (the day before closing)
    pub end: Date,

    /// Date the statement closes
    pub closing_date: Date,

    /// Date the statement must be paid
    pub due_date: Date,
}

impl StatementPeriod {
    /// Whether a purchase on `date` belongs to this statement.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Due date of the statement a purchase made on `purchase_date` lands on.
///
/// # Errors
///
/// Returns [`StatementError::Date`] if the statement would fall outside the
/// supported calendar range.
pub fn calculate_statement_date(
    purchase_date: Date,
    card: &CreditCard,
) -> Result<Date, StatementError> {
    let month = purchase_date.first_of_month();
    let closing_this_month = day_in_month(month, card.closing_day)?;

    let closing_date = if purchase_date >= closing_this_month {
        day_in_month(add_months(month, 1)?, card.closing_day)?
    } else {
        closing_this_month
    };

    card.due_date_for(closing_date)
}

/// The statement that closes in `month` of `year`.
///
/// # Errors
///
/// Returns [`StatementError::Date`] if `year`/`month` is not a valid month or
/// the period leaves the supported calendar range.
pub fn get_statement_period(
    year: i16,
    month: i8,
    card: &CreditCard,
) -> Result<StatementPeriod, StatementError> {
    let first = Date::new(year, month, 1)?;

    let closing_date = day_in_month(first, card.closing_day)?;
    let start = day_in_month(add_months(first, -1)?, card.closing_day)?;
    let end = closing_date.yesterday()?;
    let due_date = card.due_date_for(closing_date)?;

    Ok(StatementPeriod {
        start,
        end,
        closing_date,
        due_date,
    })
}

/// The statement a purchase made on `purchase_date` belongs to.
///
/// Purchases on or after the closing day fall in the statement closing the
/// following month.
///
/// # Errors
///
/// Returns [`StatementError::Date`] if the statement would fall outside the
/// supported calendar range.
pub fn statement_for_purchase(
    purchase_date: Date,
    card: &CreditCard,
) -> Result<StatementPeriod, StatementError> {
    let period = get_statement_period(purchase_date.year(), purchase_date.month(), card)?;

    if period.contains(purchase_date) {
        return Ok(period);
    }

    let next = add_months(purchase_date.first_of_month(), 1)?;

    get_statement_period(next.year(), next.month(), card)
}

fn validate_day(field: &'static str, day: u8) -> Result<(), StatementError> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(StatementError::InvalidDay { field, day })
    }
}

fn add_months(first_of_month: Date, months: i32) -> Result<Date, StatementError> {
    Ok(first_of_month.checked_add(Span::new().try_months(months)?)?)
}

/// `day` of the month starting at `first_of_month`, clamped to its last day.
fn day_in_month(first_of_month: Date, day: u8) -> Result<Date, StatementError> {
    let day = i8::try_from(day)
        .unwrap_or(i8::MAX)
        .min(first_of_month.days_in_month());

    Ok(Date::new(first_of_month.year(), first_of_month.month(), day)?)
}
