use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::classify::{classify, is_mutual_fund, Classification, Ticker, TickerMap};
use crate::config::Config;
use crate::holdings::{convert_to_currency, Holding};
use crate::pricing::PriceMap;

/// A position to be exported under its external ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEntry {
    pub ticker: String,
    pub number: Decimal,
    pub cost_number: Decimal,
    pub mutual_fund: bool,
    pub memo: String,
}

/// A synthesized purchase in the interchange document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentBuy {
    pub fitid: usize,
    pub trade_date: NaiveDateTime,
    pub memo: String,
    pub ticker: String,
    pub units: Decimal,
    pub unit_price: Decimal,
    pub fee: Decimal,
    pub mutual_fund: bool,
}

impl InvestmentBuy {
    /// Cash outflow for the purchase (negative).
    pub fn total(&self) -> Decimal {
        -(self.units * self.unit_price + self.fee)
    }
}

/// A security referenced by the exported transactions. Ordering is by
/// commodity first, which is the order securities are listed in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Security {
    pub currency: String,
    pub ticker: String,
    pub mutual_fund: bool,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include account names in memos
    pub promiscuous: bool,
    /// Currency all non-exportable holdings are converted into
    pub cash_currency: Option<String>,
    pub cash_equivalent: String,
    pub cash_equivalent_mutual_fund: bool,
    pub cash_precision: u32,
}

impl ExportOptions {
    pub fn from_config(config: &Config, promiscuous: bool) -> Self {
        Self {
            promiscuous,
            cash_currency: config.cash_currency().map(str::to_string),
            cash_equivalent: config.export.cash_equivalent.clone(),
            cash_equivalent_mutual_fund: config.export.cash_equivalent_mutual_fund,
            cash_precision: config.export.cash_precision,
        }
    }
}

/// Everything the interchange document is built from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortfolioExport {
    pub entries: Vec<ExportEntry>,
    pub transactions: Vec<InvestmentBuy>,
    pub securities: Vec<Security>,
    /// Holdings not bought individually. Their value goes into the cash
    /// equivalent, or is lost when there is no cash currency.
    pub folded: Vec<Holding>,
    pub classification: Classification,
}

/// 09:00 on the day of `now`; document timestamps are pinned to it.
pub fn morning_of(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_hms_opt(9, 0, 0).unwrap_or(now)
}

/// Build the transactions and security list for a portfolio export.
///
/// Holdings with a ticker and a cost are bought individually. Everything
/// else (cash, holdings without cost, holdings without ticker) is
/// converted into the cash currency and bought as a single cash-equivalent
/// position, so the exported portfolio keeps its total value. Without a
/// cash currency that remainder is dropped.
///
/// Lot dates are not tracked, so every purchase is dated two days before
/// `morning`.
pub fn build_export(
    holdings: &[Holding],
    price_map: &PriceMap,
    tickers: &TickerMap,
    options: &ExportOptions,
    morning: NaiveDateTime,
) -> PortfolioExport {
    let classification = classify(holdings, tickers);
    let trade_date = morning - Duration::days(2);

    let mut entries = Vec::new();
    let mut folded = Vec::new();
    let mut transactions = Vec::new();
    let mut securities = BTreeSet::new();

    for holding in holdings {
        let ticker = match tickers.for_holding(holding) {
            Ticker::Symbol(symbol) if !symbol.is_empty() => symbol,
            _ => {
                folded.push(holding.clone());
                continue;
            }
        };
        let (Some(number), Some(cost_number), Some(currency)) =
            (holding.number, holding.cost_number, holding.currency.as_ref())
        else {
            folded.push(holding.clone());
            continue;
        };
        if holding.is_cash_like() {
            folded.push(holding.clone());
            continue;
        }

        let mutual_fund = is_mutual_fund(ticker);
        let memo = if options.promiscuous {
            holding.account.clone()
        } else {
            String::new()
        };

        transactions.push(InvestmentBuy {
            fitid: transactions.len() + 1,
            trade_date,
            memo: memo.clone(),
            ticker: ticker.to_string(),
            units: number,
            unit_price: cost_number,
            fee: Decimal::ZERO,
            mutual_fund,
        });
        securities.insert(Security {
            currency: currency.clone(),
            ticker: ticker.to_string(),
            mutual_fund,
        });
        entries.push(ExportEntry {
            ticker: ticker.to_string(),
            number,
            cost_number,
            mutual_fund,
            memo,
        });
    }

    debug!(
        "Exporting {} holdings individually, {} folded into cash",
        transactions.len(),
        folded.len()
    );

    if let Some(cash_currency) = options.cash_currency.as_deref() {
        if let Some(buy) = cash_equivalent_buy(
            &folded,
            price_map,
            cash_currency,
            options,
            transactions.len() + 1,
            trade_date,
        ) {
            securities.insert(Security {
                currency: options.cash_equivalent.clone(),
                ticker: options.cash_equivalent.clone(),
                mutual_fund: options.cash_equivalent_mutual_fund,
            });
            transactions.push(buy);
        }
    }

    info!(
        "Built export with {} transactions and {} securities",
        transactions.len(),
        securities.len()
    );

    PortfolioExport {
        entries,
        transactions,
        securities: securities.into_iter().collect(),
        folded,
        classification,
    }
}

/// Fill in book and market values for the cash bucket. Cash held without
/// explicit values is worth its units.
fn with_cash_values(holding: &Holding) -> Holding {
    let units = holding.is_cash_like().then_some(holding.number).flatten();
    Holding {
        book_value: holding.effective_book_value().or(units),
        market_value: holding.effective_market_value().or(units),
        ..holding.clone()
    }
}

fn cash_equivalent_buy(
    folded: &[Holding],
    price_map: &PriceMap,
    cash_currency: &str,
    options: &ExportOptions,
    fitid: usize,
    trade_date: NaiveDateTime,
) -> Option<InvestmentBuy> {
    let valued: Vec<Holding> = folded.iter().map(with_cash_values).collect();
    let converted = convert_to_currency(price_map, cash_currency, &valued);

    let (mut book_value, mut market_value) = (Decimal::ZERO, Decimal::ZERO);
    for holding in converted
        .iter()
        .filter(|h| h.cost_currency.as_deref() == Some(cash_currency))
    {
        book_value += holding.book_value.unwrap_or_default();
        market_value += holding.market_value.unwrap_or_default();
    }

    if market_value.is_zero() {
        debug!("No value left to export as {}", options.cash_equivalent);
        return None;
    }

    let precision = options.cash_precision;
    Some(InvestmentBuy {
        fitid,
        trade_date,
        memo: String::new(),
        ticker: options.cash_equivalent.clone(),
        units: market_value.round_dp(precision),
        unit_price: (book_value / market_value).round_dp(precision),
        fee: Decimal::ZERO,
        mutual_fund: options.cash_equivalent_mutual_fund,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PriceEntry;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn options(cash_currency: Option<&str>) -> ExportOptions {
        ExportOptions {
            promiscuous: false,
            cash_currency: cash_currency.map(str::to_string),
            cash_equivalent: "VMMXX".to_string(),
            cash_equivalent_mutual_fund: true,
            cash_precision: 2,
        }
    }

    fn tickers() -> TickerMap {
        [("HOOL", "NASDAQ:HOOL"), ("VFIAX", "MUTF:VFIAX"), ("USD", "cash")]
            .into_iter()
            .map(|(c, t)| (c.to_string(), t.to_string()))
            .collect()
    }

    fn cash(account: &str, amount: Decimal, currency: &str) -> Holding {
        Holding {
            number: Some(amount),
            currency: Some(currency.to_string()),
            cost_currency: Some(currency.to_string()),
            book_value: Some(amount),
            market_value: Some(amount),
            ..Holding::new(account)
        }
    }

    #[test]
    fn test_morning_of() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_milli_opt(17, 45, 3, 250)
            .unwrap();
        assert_eq!(morning_of(now), morning());
    }

    #[test]
    fn test_exportable_holdings_become_purchases() {
        let holdings = vec![
            Holding::position(
                "Assets:Broker",
                dec!(10),
                "HOOL",
                dec!(500),
                "USD",
                Some(dec!(520)),
            ),
            Holding::position("Assets:Broker", dec!(3), "VFIAX", dec!(200), "USD", None),
        ];
        let export = build_export(
            &holdings,
            &PriceMap::default(),
            &tickers(),
            &options(None),
            morning(),
        );

        assert_eq!(export.transactions.len(), 2);
        let buy = &export.transactions[0];
        assert_eq!(buy.fitid, 1);
        assert_eq!(buy.ticker, "NASDAQ:HOOL");
        assert!(!buy.mutual_fund);
        assert_eq!(buy.total(), dec!(-5000));
        assert_eq!(buy.memo, "");
        assert_eq!(buy.trade_date, morning() - Duration::days(2));
        assert!(export.transactions[1].mutual_fund);

        assert_eq!(export.entries.len(), 2);
        assert_eq!(export.securities.len(), 2);
        assert_eq!(export.securities[0].currency, "HOOL");
    }

    #[test]
    fn test_promiscuous_memo_carries_account() {
        let holdings = vec![Holding::position(
            "Assets:Broker",
            dec!(1),
            "HOOL",
            dec!(500),
            "USD",
            None,
        )];
        let mut opts = options(None);
        opts.promiscuous = true;
        let export = build_export(&holdings, &PriceMap::default(), &tickers(), &opts, morning());
        assert_eq!(export.transactions[0].memo, "Assets:Broker");
    }

    #[test]
    fn test_cash_and_unknown_fold_into_cash_equivalent() {
        let holdings = vec![
            Holding::position(
                "Assets:Broker",
                dec!(10),
                "HOOL",
                dec!(500),
                "USD",
                Some(dec!(520)),
            ),
            cash("Assets:Bank", dec!(1000), "USD"),
            Holding::position(
                "Assets:Employer",
                dec!(4),
                "RSU",
                dec!(25),
                "USD",
                Some(dec!(50)),
            ),
        ];
        let export = build_export(
            &holdings,
            &PriceMap::default(),
            &tickers(),
            &options(Some("USD")),
            morning(),
        );

        assert_eq!(export.transactions.len(), 2);
        let cash_buy = &export.transactions[1];
        assert_eq!(cash_buy.fitid, 2);
        assert_eq!(cash_buy.ticker, "VMMXX");
        assert!(cash_buy.mutual_fund);
        // 1000 + 200 market, 1000 + 100 book
        assert_eq!(cash_buy.units, dec!(1200));
        assert_eq!(cash_buy.unit_price, dec!(0.92));
        assert!(export
            .securities
            .iter()
            .any(|s| s.ticker == "VMMXX" && s.mutual_fund));
        assert!(export.classification.ignored_commodities.contains("RSU"));
    }

    #[test]
    fn test_unknown_commodity_dropped_without_cash_currency() {
        let holdings = vec![Holding::position(
            "Assets:Employer",
            dec!(4),
            "RSU",
            dec!(25),
            "USD",
            Some(dec!(50)),
        )];
        let export = build_export(
            &holdings,
            &PriceMap::default(),
            &tickers(),
            &options(None),
            morning(),
        );
        assert!(export.transactions.is_empty());
        assert!(export.securities.is_empty());
        assert_eq!(export.classification.ignored.len(), 1);
    }

    #[test]
    fn test_cash_without_cash_currency_is_folded_and_lost() {
        let holdings = vec![cash("Assets:Bank", dec!(1000), "USD")];
        let export = build_export(
            &holdings,
            &PriceMap::default(),
            &tickers(),
            &options(None),
            morning(),
        );
        assert!(export.transactions.is_empty());
        assert!(export.classification.ignored.is_empty());
        assert_eq!(export.folded, holdings);
    }

    #[test]
    fn test_unconvertible_holdings_are_dropped_from_cash() {
        let prices = PriceMap::new(&[PriceEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            currency: "CAD".to_string(),
            quote: "USD".to_string(),
            rate: dec!(0.75),
        }]);
        let holdings = vec![
            cash("Assets:CA:Bank", dec!(400), "CAD"),
            cash("Assets:EU:Bank", dec!(999), "EUR"),
        ];
        let export = build_export(&holdings, &prices, &tickers(), &options(Some("USD")), morning());
        assert_eq!(export.transactions.len(), 1);
        assert_eq!(export.transactions[0].units, dec!(300));
        assert_eq!(export.transactions[0].unit_price, dec!(1));
    }

    #[test]
    fn test_holding_without_cost_is_not_exported_individually() {
        let mut holding = Holding::position(
            "Assets:Broker",
            dec!(2),
            "HOOL",
            dec!(1),
            "USD",
            Some(dec!(600)),
        );
        holding.cost_number = None;
        holding.book_value = None;
        let export = build_export(
            &[holding],
            &PriceMap::default(),
            &tickers(),
            &options(Some("USD")),
            morning(),
        );
        assert_eq!(export.transactions.len(), 1);
        assert_eq!(export.transactions[0].ticker, "VMMXX");
        assert_eq!(export.transactions[0].units, dec!(1200));
        assert_eq!(export.transactions[0].unit_price, dec!(0));
    }

    #[test]
    fn test_zero_cash_value_adds_no_transaction() {
        let export = build_export(
            &[cash("Assets:Bank", dec!(0), "USD")],
            &PriceMap::default(),
            &tickers(),
            &options(Some("USD")),
            morning(),
        );
        assert!(export.transactions.is_empty());
    }
}
