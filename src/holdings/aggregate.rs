use rust_decimal::Decimal;
use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;
use tracing::debug;

use super::{account_common_prefix, account_root, Holding};

/// Named grouping keys for holdings reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationKey {
    /// By the commodity held
    Commodity,
    /// By owning account
    Account,
    /// By the first three components of the account
    RootAccount,
    /// By cost currency
    Currency,
}

impl AggregationKey {
    pub fn key(&self, holding: &Holding) -> Option<String> {
        match self {
            AggregationKey::Commodity => holding.currency.clone(),
            AggregationKey::Account => Some(holding.account.clone()),
            AggregationKey::RootAccount => Some(account_root(3, &holding.account)),
            AggregationKey::Currency => holding.cost_currency.clone(),
        }
    }

    /// Whether the grouped report is ordered by descending market value.
    pub fn sorts_by_market_value(&self) -> bool {
        matches!(self, AggregationKey::RootAccount)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKey::Commodity => "commodity",
            AggregationKey::Account => "account",
            AggregationKey::RootAccount => "root-account",
            AggregationKey::Currency => "currency",
        }
    }
}

impl FromStr for AggregationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "commodity" => Ok(AggregationKey::Commodity),
            "account" => Ok(AggregationKey::Account),
            "root-account" => Ok(AggregationKey::RootAccount),
            "currency" => Ok(AggregationKey::Currency),
            _ => Err(format!("Unknown aggregation: {}", s)),
        }
    }
}

/// Merge holdings sharing the same key into one holding per key.
///
/// Groups come out in the order their key was first seen.
pub fn aggregate_holdings_by<K, F>(holdings: &[Holding], key_fn: F) -> Vec<Holding>
where
    K: Eq + Hash,
    F: Fn(&Holding) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Holding>> = Vec::new();

    for holding in holdings {
        let slot = *index.entry(key_fn(holding)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(holding);
    }

    debug!("Aggregated {} holdings into {} groups", holdings.len(), groups.len());
    groups.iter().map(|group| aggregate_group(group)).collect()
}

fn homogeneous<'a, I>(mut values: I) -> Option<Option<&'a String>>
where
    I: Iterator<Item = Option<&'a String>>,
{
    let first = values.next()?;
    values.all(|value| value == first).then_some(first)
}

fn sum_defined<I>(values: I) -> Option<Decimal>
where
    I: Iterator<Item = Option<Decimal>>,
{
    values.flatten().fold(None, |acc, value| Some(acc.unwrap_or_default() + value))
}

fn aggregate_group(group: &[&Holding]) -> Holding {
    let currency = homogeneous(group.iter().map(|h| h.currency.as_ref()));
    let cost_currency = homogeneous(group.iter().map(|h| h.cost_currency.as_ref()));

    // Units only add up within a single commodity held at a single cost currency.
    let number: Option<Decimal> = match (currency, cost_currency) {
        (Some(_), Some(_)) if group.iter().all(|h| h.number.is_some()) => {
            Some(group.iter().filter_map(|h| h.number).sum::<Decimal>())
        }
        _ => None,
    };

    let book_value = sum_defined(group.iter().map(|h| h.effective_book_value()));
    let market_value = sum_defined(group.iter().map(|h| h.effective_market_value()));

    let per_unit = |total: Option<Decimal>| match (total, number) {
        (Some(total), Some(units)) if !units.is_zero() => Some(total / units),
        _ => None,
    };

    let price_date = {
        let first = group.first().and_then(|h| h.price_date);
        group
            .iter()
            .all(|h| h.price_date == first)
            .then_some(first)
            .flatten()
    };

    let account = if group.iter().all(|h| h.account == group[0].account) {
        group[0].account.clone()
    } else {
        account_common_prefix(group.iter().map(|h| h.account.as_str()))
    };

    Holding {
        account,
        number,
        currency: currency.flatten().cloned(),
        cost_currency: cost_currency.flatten().cloned(),
        cost_number: per_unit(book_value),
        price_number: per_unit(market_value),
        book_value,
        market_value,
        price_date,
    }
}
