//! Quote reports

use std::{io, ops::RangeInclusive};

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde_json::Value;
use tabled::{
    Table,
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    installments::Installment,
    money::{CurrencyError, to_money},
    payments::{PaymentMethodEntry, PaymentValidation, payments_total},
    totals::CalculatedTotals,
    webhook::{FINANCIALS_EVENT, WebhookContext, WebhookError, prepare_webhook_payload},
};

/// Errors that can occur when rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An amount could not be formatted in the report currency.
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    /// Writing the report failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Everything calculated for a single quote.
#[derive(Debug, Clone)]
pub struct QuoteReport {
    /// Service order identifier
    pub order_id: String,

    /// Currency of every amount
    pub currency: &'static Currency,

    /// Discounted totals
    pub totals: CalculatedTotals,

    /// Installment schedule for the grand total
    pub installments: Vec<Installment>,

    /// Declared payment methods
    pub payment_methods: Vec<PaymentMethodEntry>,

    /// Payment methods reconciled against the grand total
    pub validation: PaymentValidation,
}

impl QuoteReport {
    /// Build the webhook document for this quote.
    ///
    /// # Errors
    ///
    /// Returns a [`WebhookError`] if the grand total cannot be represented in
    /// the quote currency.
    pub fn webhook_payload(&self, generated_at: Timestamp) -> Result<Value, WebhookError> {
        let context = WebhookContext {
            event: FINANCIALS_EVENT.to_string(),
            order_id: self.order_id.clone(),
            currency: self.currency,
            generated_at,
        };

        prepare_webhook_payload(
            &context,
            &self.totals,
            &self.installments,
            &self.payment_methods,
        )
    }

    /// Writes the totals and installment tables.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be formatted or writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let totals = self.totals_table()?;

        writeln!(out, "\n{totals}")?;

        if !self.installments.is_empty() {
            let installments = self.installments_table()?;

            writeln!(out, "\n{installments}")?;
        }

        let status = if self.validation.valid {
            "reconciled"
        } else {
            "NOT reconciled"
        };

        writeln!(
            out,
            "\n Payments: {} ({status}, difference {})\n",
            self.format(payments_total(&self.payment_methods))?,
            self.format(self.validation.diff)?,
        )?;

        Ok(())
    }

    fn totals_table(&self) -> Result<Table, ReportError> {
        let mut builder = Builder::default();
        let totals = &self.totals;

        builder.push_record(["", "Subtotal", "Discount", "Total"]);

        builder.push_record([
            "Parts".to_string(),
            self.format(totals.subtotal_parts)?,
            self.format(totals.discount_parts)?,
            self.format(totals.total_parts)?,
        ]);

        builder.push_record([
            "Services".to_string(),
            self.format(totals.subtotal_services)?,
            self.format(totals.discount_services)?,
            self.format(totals.total_services)?,
        ]);

        builder.push_record([
            "Order".to_string(),
            self.format(totals.subtotal_after_categories())?,
            self.format(totals.discount_total)?,
            self.format(totals.grand_total)?,
        ]);

        Ok(styled(builder, 1..=3))
    }

    fn installments_table(&self) -> Result<Table, ReportError> {
        let mut builder = Builder::default();

        builder.push_record(["#", "Days", "Due", "Amount", "Status"]);

        for installment in &self.installments {
            builder.push_record([
                installment.number.to_string(),
                installment.days.to_string(),
                installment.due_date.to_string(),
                self.format(installment.amount)?,
                installment.status.to_string(),
            ]);
        }

        Ok(styled(builder, 3..=3))
    }

    fn format(&self, amount: Decimal) -> Result<String, CurrencyError> {
        Ok(to_money(amount, self.currency)?.to_string())
    }
}

/// Rounded theme with a rule under a bold header and right-aligned amounts.
fn styled(builder: Builder, amount_columns: RangeInclusive<usize>) -> Table {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(amount_columns), Alignment::right());

    table
}
