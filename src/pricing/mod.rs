// Pricing module - currency conversion rates as of a date

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A single price directive: one unit of `currency` is worth `rate` units
/// of `quote` on `date`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceEntry {
    pub date: NaiveDate,
    pub currency: String,
    pub quote: String,
    pub rate: Decimal,
}

/// Rate lookup keyed by (base, quote), each pair holding a date-ordered
/// series. Inverse pairs are derived on insertion.
#[derive(Debug, Clone, Default)]
pub struct PriceMap {
    rates: HashMap<(String, String), BTreeMap<NaiveDate, Decimal>>,
}

impl PriceMap {
    pub fn new(entries: &[PriceEntry]) -> Self {
        let mut map = Self::default();
        for entry in entries {
            map.insert(entry);
        }
        debug!("Built price map with {} pairs", map.rates.len());
        map
    }

    fn insert(&mut self, entry: &PriceEntry) {
        if entry.currency == entry.quote {
            return;
        }

        // Explicit rates win over derived inverses on the same date.
        self.rates
            .entry((entry.currency.clone(), entry.quote.clone()))
            .or_default()
            .insert(entry.date, entry.rate);

        if !entry.rate.is_zero() {
            self.rates
                .entry((entry.quote.clone(), entry.currency.clone()))
                .or_default()
                .entry(entry.date)
                .or_insert(Decimal::ONE / entry.rate);
        }
    }

    /// Latest known rate for the pair, with the date it was quoted.
    /// Same-currency lookups always yield 1 with no date.
    pub fn get_latest_price(
        &self,
        base: &str,
        quote: &str,
    ) -> Option<(Option<NaiveDate>, Decimal)> {
        if base == quote {
            return Some((None, Decimal::ONE));
        }
        self.rates
            .get(&(base.to_string(), quote.to_string()))?
            .iter()
            .next_back()
            .map(|(date, rate)| (Some(*date), *rate))
    }

    /// Rate in effect on `date`: the latest quote on or before it.
    pub fn get_price(&self, base: &str, quote: &str, date: NaiveDate) -> Option<Decimal> {
        if base == quote {
            return Some(Decimal::ONE);
        }
        self.rates
            .get(&(base.to_string(), quote.to_string()))?
            .range(..=date)
            .next_back()
            .map(|(_, rate)| *rate)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
