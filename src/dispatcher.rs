//! Command dispatcher that routes parsed clap commands to the report
//! handlers and writes their output.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::cli::{formatters, Cli, Commands};
use ledger_holdings::config::Config;
use ledger_holdings::reports::{self, render_table, Ledger, OutputFormat, Table};

/// Route a parsed command line to its handler
pub fn dispatch_command(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let format = OutputFormat::from(cli.format);
    let mut out = open_output(cli.output.as_deref())?;

    match &cli.command {
        Commands::Holdings {
            file,
            currency,
            relative,
            group_by,
        } => {
            let ledger = Ledger::load(file, config)?;
            let options = reports::HoldingsReportOptions {
                currency: currency.clone(),
                relative: *relative,
                group_by: group_by.map(Into::into),
            };
            let table = reports::report_holdings(&ledger, &options)?;
            write_table(&table, "holdings", format, &mut out)
        }
        Commands::Cash {
            file,
            currency,
            ignored,
            operating_only,
        } => {
            let ledger = Ledger::load(file, config)?;
            let options = reports::CashReportOptions {
                currency: currency.clone(),
                ignored: *ignored,
                operating_only: *operating_only,
            };
            write_table(&reports::report_cash(&ledger, &options), "cash holdings", format, &mut out)
        }
        Commands::Networth { file } => {
            let ledger = Ledger::load(file, config)?;
            write_table(&reports::report_net_worth(&ledger), "net worth", format, &mut out)
        }
        Commands::Export { file, promiscuous } => {
            let ledger = Ledger::load(file, config)?;
            dispatch_export(&ledger, *promiscuous, cli.verbose, &mut out)
        }
        Commands::Classify { file } => {
            let ledger = Ledger::load(file, config)?;
            let classification = reports::classify_holdings(&ledger);
            if format == OutputFormat::Json {
                writeln!(out, "{}", serde_json::to_string_pretty(&classification)?)?;
            } else {
                write!(out, "{}", formatters::format_classification(&classification)?)?;
            }
            out.flush()?;
            Ok(())
        }
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn write_table(
    table: &Table,
    title: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    if table.is_empty() && format == OutputFormat::Text {
        write!(out, "{}", formatters::format_empty_report(title))?;
    } else {
        render_table(table, format, out)?;
    }
    out.flush()?;
    Ok(())
}

fn dispatch_export(
    ledger: &Ledger,
    promiscuous: bool,
    verbose: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let now = Local::now().naive_local();
    let (document, export) = reports::export_portfolio(ledger, promiscuous, now);
    info!(
        "Exported {} transactions, {} securities",
        export.transactions.len(),
        export.securities.len()
    );

    if verbose {
        eprint!(
            "{}",
            formatters::format_ignored_commodities(&export.classification.ignored_commodities)
        );
        if let Some(warning) =
            formatters::format_dropped_value(&export, ledger.config.cash_currency())
        {
            eprint!("{}", warning);
        }
    }

    write!(out, "{}", document)?;
    out.flush()?;
    Ok(())
}
