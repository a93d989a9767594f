// Reports module - holdings, cash, net worth and portfolio export

pub mod holdings;
pub mod table;

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::export::TickerMap;
use crate::holdings::{convert_to_currency, Holding};
use crate::importers;
use crate::pricing::PriceMap;

pub use holdings::{
    cash_rows, classify_holdings, export_portfolio, field_spec, holdings_rows, net_worth_rows,
    relative_field_spec, report_cash, report_holdings, report_net_worth, CashReportOptions,
    HoldingsReportOptions, NetWorth,
};
pub use table::{create_table, render_table, Column, OutputFormat, Table};

/// Immutable snapshot a report runs against: the final holdings plus the
/// ledger context (prices, commodity tickers, options).
#[derive(Debug, Clone)]
pub struct Ledger {
    pub holdings: Vec<Holding>,
    pub price_map: PriceMap,
    pub tickers: TickerMap,
    pub config: Config,
}

impl Ledger {
    pub fn new(holdings: Vec<Holding>, config: Config) -> Self {
        Self {
            holdings,
            price_map: config.price_map(),
            tickers: config.tickers(),
            config,
        }
    }

    /// Load holdings from a snapshot file.
    pub fn load<P: AsRef<Path>>(holdings_path: P, config: Config) -> Result<Self> {
        let holdings = importers::import_file(holdings_path)?;
        Ok(Self::new(holdings, config))
    }

    /// Holdings of the snapshot, optionally valued in `currency`.
    pub fn assets_holdings(&self, currency: Option<&str>) -> Vec<Holding> {
        match currency {
            Some(currency) => {
                debug!("Converting {} holdings to {}", self.holdings.len(), currency);
                convert_to_currency(&self.price_map, currency, &self.holdings)
            }
            None => self.holdings.clone(),
        }
    }
}
