//! fieldledger CLI

use std::{
    io::{self, Write},
    path::PathBuf,
    process,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldledger::{
    fixtures::{FixtureError, Quote},
    report::ReportError,
    statements::{CreditCard, StatementError, calculate_statement_date, statement_for_purchase},
    webhook::WebhookError,
};
use jiff::{Timestamp, civil::Date};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

#[derive(Debug, Parser)]
#[command(
    name = "fieldledger",
    about = "Service order financial calculations",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

#[derive(Debug, Args)]
struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Calculate totals, installments and payment reconciliation for a quote file
    Quote(QuoteArgs),

    /// Work out which credit-card statement a purchase lands on
    Statement(StatementArgs),
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// YAML quote file
    file: PathBuf,

    /// Print the webhook JSON payload instead of tables
    #[arg(long)]
    json: bool,

    /// Override the order identifier from the quote file
    #[arg(long)]
    order_id: Option<String>,
}

#[derive(Debug, Args)]
struct StatementArgs {
    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    purchase_date: Date,

    /// Day of the month the statement closes
    #[arg(long)]
    closing_day: u8,

    /// Day of the month the statement falls due
    #[arg(long)]
    due_day: u8,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[expect(clippy::print_stderr, reason = "CLI error reporting")]
pub fn main() {
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = init_subscriber(&cli.logging) {
        eprintln!("failed to initialise logging: {error}");
        process::exit(1);
    }

    if let Err(error) = run(cli.command) {
        eprintln!("{error}");
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Quote(args) => quote(args, &mut out),
        Commands::Statement(args) => statement(&args, &mut out),
    }
}

fn quote(args: QuoteArgs, out: &mut impl Write) -> Result<(), CliError> {
    let mut quote = Quote::from_path(&args.file)?;

    if let Some(order_id) = args.order_id {
        quote.order_id = order_id;
    }

    info!(file = %args.file.display(), order_id = %quote.order_id, "loaded quote");

    let report = quote.evaluate();

    if args.json {
        let payload = report.webhook_payload(Timestamp::now())?;

        serde_json::to_writer_pretty(&mut *out, &payload)?;
        writeln!(out)?;
    } else {
        report.write_to(out)?;
    }

    Ok(())
}

fn statement(args: &StatementArgs, out: &mut impl Write) -> Result<(), CliError> {
    let card = CreditCard::new(args.closing_day, args.due_day)?;
    let purchase = args.purchase_date;

    let due_date = calculate_statement_date(purchase, &card)?;
    let period = statement_for_purchase(purchase, &card)?;

    writeln!(out, "purchase:  {purchase}")?;
    writeln!(out, "period:    {} .. {}", period.start, period.end)?;
    writeln!(out, "closes:    {}", period.closing_date)?;
    writeln!(out, "due:       {due_date}")?;

    Ok(())
}

fn init_subscriber(config: &LoggingConfig) -> Result<(), TryInitError> {
    match config.log_format {
        LogFormat::Compact => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(io::stderr),
        ),
        LogFormat::Json => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_writer(io::stderr),
        ),
    }
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.log_level).unwrap_or_else(|_err| EnvFilter::new("warn"))
}

fn init_with_layer<L>(config: &LoggingConfig, fmt_layer: L) -> Result<(), TryInitError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_env_filter(config))
        .try_init()
}
