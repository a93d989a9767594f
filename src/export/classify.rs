use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::holdings::Holding;

/// Mutual funds use `MUTF` exchange prefixes in ticker symbology
/// (e.g. `MUTF:VFIAX`, `MUTF_CA:RBF556`).
static MUTUAL_FUND: Lazy<Regex> = Lazy::new(|| Regex::new(r"^MUTF.*:").unwrap());

pub fn is_mutual_fund(ticker: &str) -> bool {
    MUTUAL_FUND.is_match(ticker)
}

/// Result of looking a commodity up in the ticker metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticker<'a> {
    /// The commodity declares no ticker
    Undefined,
    /// Explicit `cash` marker
    Cash,
    Symbol(&'a str),
}

/// Commodity code -> external ticker symbol.
#[derive(Debug, Clone, Default)]
pub struct TickerMap {
    tickers: HashMap<String, String>,
}

impl TickerMap {
    pub fn new(tickers: HashMap<String, String>) -> Self {
        Self { tickers }
    }

    pub fn get(&self, currency: &str) -> Ticker<'_> {
        match self.tickers.get(currency) {
            None => Ticker::Undefined,
            Some(ticker) if ticker.eq_ignore_ascii_case("cash") => Ticker::Cash,
            Some(ticker) => Ticker::Symbol(ticker),
        }
    }

    /// Ticker for a holding's commodity; holdings without one are undefined.
    pub fn for_holding(&self, holding: &Holding) -> Ticker<'_> {
        holding
            .currency
            .as_deref()
            .map_or(Ticker::Undefined, |currency| self.get(currency))
    }
}

impl FromIterator<(String, String)> for TickerMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Holdings partitioned by how they can be exported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    /// Holdings with a ticker of their own
    pub exportable: Vec<Holding>,
    /// Holdings whose ticker is the cash marker
    pub cashlike: Vec<Holding>,
    /// Holdings with no usable ticker
    pub ignored: Vec<Holding>,
    /// Commodities with no ticker declared at all
    pub ignored_commodities: BTreeSet<String>,
}

pub fn classify(holdings: &[Holding], tickers: &TickerMap) -> Classification {
    let mut result = Classification::default();

    for holding in holdings {
        match tickers.for_holding(holding) {
            Ticker::Cash => result.cashlike.push(holding.clone()),
            Ticker::Symbol(symbol) if !symbol.is_empty() => result.exportable.push(holding.clone()),
            Ticker::Symbol(_) => result.ignored.push(holding.clone()),
            Ticker::Undefined => {
                if let Some(currency) = &holding.currency {
                    result.ignored_commodities.insert(currency.clone());
                }
                result.ignored.push(holding.clone());
            }
        }
    }

    result
}
