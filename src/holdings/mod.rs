//! Holdings - immutable position snapshots and the pure transformations
//! applied to them (currency conversion, aggregation, relative reduction).

pub mod aggregate;
pub mod convert;
pub mod relative;

pub use aggregate::{aggregate_holdings_by, AggregationKey};
pub use convert::convert_to_currency;
pub use relative::reduce_relative;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A snapshot of a quantity of one commodity held in one account.
///
/// Every field except the account is optional. A holding produced by
/// aggregating heterogeneous units has no `number` and may have no
/// `currency` or `cost_currency`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Holding {
    pub account: String,
    pub number: Option<Decimal>,
    pub currency: Option<String>,
    pub cost_currency: Option<String>,
    pub cost_number: Option<Decimal>,
    pub price_number: Option<Decimal>,
    pub book_value: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub price_date: Option<NaiveDate>,
}

impl Holding {
    /// Create a holding for `account` with every other field absent.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    /// Create a fully-valued position, deriving book and market values
    /// from the per-unit cost and price.
    pub fn position(
        account: impl Into<String>,
        number: Decimal,
        currency: &str,
        cost_number: Decimal,
        cost_currency: &str,
        price_number: Option<Decimal>,
    ) -> Self {
        Self {
            account: account.into(),
            number: Some(number),
            currency: Some(currency.to_string()),
            cost_currency: Some(cost_currency.to_string()),
            cost_number: Some(cost_number),
            price_number,
            book_value: Some(number * cost_number),
            market_value: price_number.map(|price| number * price),
            price_date: None,
        }
    }

    /// A cash-like holding is denominated in its own cost currency.
    pub fn is_cash_like(&self) -> bool {
        self.currency.is_some() && self.currency == self.cost_currency
    }

    /// Book value, falling back to `number * cost_number`.
    pub fn effective_book_value(&self) -> Option<Decimal> {
        self.book_value
            .or_else(|| Some(self.number? * self.cost_number?))
    }

    /// Market value, falling back to `number * price_number`.
    pub fn effective_market_value(&self) -> Option<Decimal> {
        self.market_value
            .or_else(|| Some(self.number? * self.price_number?))
    }

    pub fn with_price_date(mut self, date: NaiveDate) -> Self {
        self.price_date = Some(date);
        self
    }
}

/// Root of an account name: its first `depth` colon-separated components.
pub fn account_root(depth: usize, account: &str) -> String {
    account.split(':').take(depth).collect::<Vec<_>>().join(":")
}

/// Longest common colon-separated prefix of a set of account names.
pub fn account_common_prefix<'a, I>(accounts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut iter = accounts.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut prefix: Vec<&str> = first.split(':').collect();
    for account in iter {
        let common = prefix
            .iter()
            .zip(account.split(':'))
            .take_while(|(a, b)| *a == b)
            .count();
        prefix.truncate(common);
    }
    prefix.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_holding_defaults_to_absent() {
        let holding = Holding::new("Assets:Cash");
        assert_eq!(holding.account, "Assets:Cash");
        assert!(holding.number.is_none());
        assert!(holding.currency.is_none());
        assert!(holding.market_value.is_none());
        assert!(holding.price_date.is_none());
    }

    #[test]
    fn test_position_derives_values() {
        let h = Holding::position(
            "Assets:Broker",
            dec!(10),
            "HOOL",
            dec!(100),
            "USD",
            Some(dec!(110)),
        );
        assert_eq!(h.book_value, Some(dec!(1000)));
        assert_eq!(h.market_value, Some(dec!(1100)));
        assert!(!h.is_cash_like());
    }

    #[test]
    fn test_cash_like() {
        let h = Holding::position(
            "Assets:Bank",
            dec!(500),
            "USD",
            dec!(1),
            "USD",
            Some(dec!(1)),
        );
        assert!(h.is_cash_like());
        assert!(!Holding::new("Assets:Empty").is_cash_like());
    }

    #[test]
    fn test_effective_values_fall_back_to_per_unit() {
        let mut h = Holding::new("Assets:X");
        h.number = Some(dec!(4));
        h.cost_number = Some(dec!(2.5));
        assert_eq!(h.effective_book_value(), Some(dec!(10.0)));
        assert_eq!(h.effective_market_value(), None);
    }

    #[test]
    fn test_account_root_and_prefix() {
        assert_eq!(account_root(3, "Assets:US:Broker:HOOL"), "Assets:US:Broker");
        assert_eq!(account_root(3, "Assets:Cash"), "Assets:Cash");
        assert_eq!(
            account_common_prefix(["Assets:US:Broker:HOOL", "Assets:US:Broker:AAPL"]),
            "Assets:US:Broker"
        );
        assert_eq!(account_common_prefix(["Assets:CA", "Liabilities:CA"]), "");
        assert_eq!(account_common_prefix(["Assets:CA"]), "Assets:CA");
    }
}
