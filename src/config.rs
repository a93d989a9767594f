//! Ledger context for the holdings snapshot
//!
//! A holdings CSV carries positions only. Everything else the reports need
//! (operating currencies, commodity tickers, conversion prices, export
//! options) comes from a TOML file:
//!
//! ```toml
//! title = "Family Ledger"
//! operating_currency = ["USD", "CAD"]
//!
//! [commodities.HOOL]
//! ticker = "NASDAQ:HOOL"
//!
//! [commodities.USD]
//! ticker = "cash"
//!
//! [[prices]]
//! date = "2024-01-02"
//! currency = "CAD"
//! quote = "USD"
//! rate = "0.75"
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::export::TickerMap;
use crate::pricing::{PriceEntry, PriceMap};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: Option<String>,
    pub operating_currency: Vec<String>,
    pub commodities: BTreeMap<String, CommodityMeta>,
    pub prices: Vec<PriceEntry>,
    pub export: ExportConfig,
}

/// Commodity metadata. A commodity without `ticker` has no external
/// identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommodityMeta {
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Broker identifier written into the document header
    pub broker: String,
    /// Security standing in for all holdings that can't be exported
    pub cash_equivalent: String,
    pub cash_equivalent_mutual_fund: bool,
    /// Decimal places for the cash-equivalent units and price
    pub cash_precision: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            broker: "ledger-holdings".to_string(),
            // Money market fund with a price pinned at 1.0 USD
            cash_equivalent: "VMMXX".to_string(),
            cash_equivalent_mutual_fund: true,
            cash_precision: 2,
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse configuration")
    }

    /// Default config location: `<config_home>/ledger-holdings/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dir_spec::config_home().map(|dir| dir.join("ledger-holdings").join("config.toml"))
    }

    /// Load an explicit config file, or the default one when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(explicit) => explicit.to_path_buf(),
            None => match Self::default_path() {
                Some(default) if default.exists() => default,
                _ => {
                    debug!("No configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        info!("Loading configuration from {:?}", path);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(blank) = self.operating_currency.iter().find(|c| c.trim().is_empty()) {
            return Err(anyhow!("Invalid operating currency: '{}'", blank));
        }
        Ok(())
    }

    /// Commodity code -> ticker, for commodities that declare one.
    pub fn tickers(&self) -> TickerMap {
        let tickers: HashMap<String, String> = self
            .commodities
            .iter()
            .filter_map(|(code, meta)| meta.ticker.clone().map(|ticker| (code.clone(), ticker)))
            .collect();
        TickerMap::new(tickers)
    }

    pub fn price_map(&self) -> PriceMap {
        PriceMap::new(&self.prices)
    }

    /// Currency the export converts unidentified holdings into.
    pub fn cash_currency(&self) -> Option<&str> {
        self.operating_currency.first().map(String::as_str)
    }
}
