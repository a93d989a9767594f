use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ledger_holdings::holdings::AggregationKey;
use ledger_holdings::reports::OutputFormat;

pub mod formatters;

#[derive(Parser)]
#[command(name = "ledger-holdings")]
#[command(
    version,
    about = "Holdings reports and portfolio export for ledger snapshots"
)]
#[command(
    long_about = "Aggregate, convert and export the final holdings of a ledger: detailed and relative holdings tables, cash and net worth reports, and an OFX portfolio file for external portfolio software."
)]
pub struct Cli {
    /// Ledger configuration file (operating currencies, tickers, prices)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Show debug logs and export diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for tables
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Write output to this file instead of stdout
    #[arg(long, global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// The full list of holdings for asset and liability accounts
    Holdings {
        /// Holdings CSV file
        file: PathBuf,

        /// Which currency to convert all the holdings to
        #[arg(short, long)]
        currency: Option<String>,

        /// Render as relative values only (needs --currency)
        #[arg(short, long)]
        relative: bool,

        /// How to group the holdings (default is: don't group)
        #[arg(short = 'g', long = "groupby", visible_alias = "by", value_enum)]
        group_by: Option<GroupBy>,
    },

    /// Cash holdings (currency equals cost currency)
    Cash {
        /// Holdings CSV file
        file: PathBuf,

        /// Which currency to convert all the holdings to
        #[arg(short, long)]
        currency: Option<String>,

        /// Report on ignored holdings instead of included ones
        #[arg(short, long)]
        ignored: bool,

        /// Only report on operating currencies
        #[arg(short, long)]
        operating_only: bool,
    },

    /// Total net worth in each operating currency
    #[command(visible_alias = "equity")]
    Networth {
        /// Holdings CSV file
        file: PathBuf,
    },

    /// Export holdings as OFX for external portfolio software
    #[command(visible_aliases = ["pfexport", "export-portfolio"])]
    Export {
        /// Holdings CSV file
        file: PathBuf,

        /// Include title and account names in memos.
        /// Use this if you trust wherever you upload.
        #[arg(short, long)]
        promiscuous: bool,
    },

    /// Show how holdings are classified for export
    Classify {
        /// Holdings CSV file
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupBy {
    Commodity,
    Account,
    RootAccount,
    Currency,
}

impl From<GroupBy> for AggregationKey {
    fn from(value: GroupBy) -> Self {
        match value {
            GroupBy::Commodity => AggregationKey::Commodity,
            GroupBy::Account => AggregationKey::Account,
            GroupBy::RootAccount => AggregationKey::RootAccount,
            GroupBy::Currency => AggregationKey::Currency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Csv,
    Html,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Text => OutputFormat::Text,
            Format::Csv => OutputFormat::Csv,
            Format::Html => OutputFormat::Html,
            Format::Json => OutputFormat::Json,
        }
    }
}
