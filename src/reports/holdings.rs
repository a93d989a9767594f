use anyhow::Result;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, info};

use super::table::{create_table, Column, Table};
use super::Ledger;
use crate::error::HoldingsError;
use crate::export::{self, Classification, DocumentInfo, ExportOptions, PortfolioExport};
use crate::holdings::{
    aggregate_holdings_by, convert_to_currency, reduce_relative, AggregationKey, Holding,
};
use crate::utils::{format_number, format_optional, format_percent};

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// All fields of a holding.
pub fn field_spec() -> Vec<Column<Holding>> {
    vec![
        Column::text("account", "Account", |h: &Holding| h.account.clone()),
        Column::number("number", "Units", |h: &Holding| format_optional(h.number, format_number)),
        Column::text("currency", "Currency", |h: &Holding| text(&h.currency)),
        Column::text("cost_currency", "Cost Currency", |h: &Holding| text(&h.cost_currency)),
        Column::number("cost_number", "Average Cost", |h: &Holding| {
            format_optional(h.cost_number, format_number)
        }),
        Column::number("price_number", "Price", |h: &Holding| {
            format_optional(h.price_number, format_number)
        }),
        Column::number("book_value", "Book Value", |h: &Holding| {
            format_optional(h.book_value, format_number)
        }),
        Column::number("market_value", "Market Value", |h: &Holding| {
            format_optional(h.market_value, format_number)
        }),
    ]
}

/// Fields for relative reports. Book value, units and account are left out:
/// together with the fraction and price they would reveal the absolute size
/// of the portfolio.
pub fn relative_field_spec() -> Vec<Column<Holding>> {
    let hidden = ["account", "number", "book_value", "market_value"];
    let mut spec: Vec<Column<Holding>> = field_spec()
        .into_iter()
        .filter(|column| !hidden.contains(&column.name))
        .collect();
    spec.push(Column::number("market_value", "Frac Folio", |h: &Holding| {
        format_optional(h.market_value, format_percent)
    }));
    spec
}

/// Options of the holdings report.
#[derive(Debug, Clone, Default)]
pub struct HoldingsReportOptions {
    /// Convert all holdings to this currency
    pub currency: Option<String>,
    /// Reduce market values to fractions of the total
    pub relative: bool,
    pub group_by: Option<AggregationKey>,
}

/// Holdings report rows.
///
/// Holdings are optionally converted, grouped with `aggregation_key`,
/// reduced to relative values and finally sorted in decreasing order of
/// `sort_key`.
pub fn holdings_rows(
    ledger: &Ledger,
    currency: Option<&str>,
    relative: bool,
    aggregation_key: Option<&dyn Fn(&Holding) -> Option<String>>,
    sort_key: Option<fn(&Holding) -> Decimal>,
) -> Result<Vec<Holding>> {
    if relative && currency.is_none() {
        return Err(HoldingsError::Configuration(
            "a relative report needs a target currency".to_string(),
        )
        .into());
    }

    let mut holdings = ledger.assets_holdings(currency);
    if let Some(key) = aggregation_key {
        holdings = aggregate_holdings_by(&holdings, key);
    }
    if relative {
        holdings = reduce_relative(&holdings);
    }
    if let Some(sort_key) = sort_key {
        holdings.sort_by_key(|h| Reverse(sort_key(h)));
    }

    debug!("Holdings report has {} rows", holdings.len());
    Ok(holdings)
}

fn market_value_or_zero(holding: &Holding) -> Decimal {
    holding.market_value.unwrap_or_default()
}

/// Generate the holdings table.
pub fn report_holdings(ledger: &Ledger, options: &HoldingsReportOptions) -> Result<Table> {
    info!("Generating holdings report");

    let group_by = options.group_by;
    let sort_key = group_by
        .filter(AggregationKey::sorts_by_market_value)
        .map(|_| market_value_or_zero as fn(&Holding) -> Decimal);
    let aggregation_key = group_by.map(|key| move |h: &Holding| key.key(h));

    let holdings = holdings_rows(
        ledger,
        options.currency.as_deref(),
        options.relative,
        aggregation_key
            .as_ref()
            .map(|key| key as &dyn Fn(&Holding) -> Option<String>),
        sort_key,
    )?;

    let spec = if options.relative {
        relative_field_spec()
    } else {
        field_spec()
    };
    Ok(create_table(&holdings, &spec))
}

/// Options of the cash report.
#[derive(Debug, Clone, Default)]
pub struct CashReportOptions {
    pub currency: Option<String>,
    /// Report the holdings left out instead of the cash ones
    pub ignored: bool,
    /// Only cash in one of the operating currencies
    pub operating_only: bool,
}

/// Cash holdings: positions denominated in their own cost currency, or
/// without any cost currency.
pub fn cash_rows(ledger: &Ledger, options: &CashReportOptions) -> Vec<Holding> {
    let operating: HashSet<&str> = ledger
        .config
        .operating_currency
        .iter()
        .map(String::as_str)
        .collect();

    let is_cash = |h: &Holding| {
        let cash_like = h.is_cash_like() || h.cost_currency.is_none();
        let operating_ok = !options.operating_only
            || h.currency.as_deref().is_some_and(|c| operating.contains(c));
        cash_like && operating_ok
    };

    let selected: Vec<Holding> = ledger
        .holdings
        .iter()
        .filter(|h| is_cash(*h) != options.ignored)
        .cloned()
        .collect();

    match options.currency.as_deref() {
        Some(currency) => convert_to_currency(&ledger.price_map, currency, &selected),
        None => selected,
    }
}

pub fn report_cash(ledger: &Ledger, options: &CashReportOptions) -> Table {
    info!("Generating cash report");
    create_table(&cash_rows(ledger, options), &field_spec())
}

/// Total value of all holdings in one operating currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetWorth {
    pub currency: String,
    pub market_value: Option<Decimal>,
}

/// Net worth in each operating currency.
///
/// The price map may not cover every conversion. Holdings that cannot be
/// converted are left out of the total, and a currency nothing converts
/// into is skipped.
pub fn net_worth_rows(ledger: &Ledger) -> Vec<NetWorth> {
    ledger
        .config
        .operating_currency
        .iter()
        .filter_map(|currency| {
            let converted = convert_to_currency(&ledger.price_map, currency, &ledger.holdings);
            let total = aggregate_holdings_by(&converted, |h| h.cost_currency.clone())
                .into_iter()
                .find(|h| h.cost_currency.as_deref() == Some(currency.as_str()));
            if total.is_none() {
                debug!("No holdings convert to {}, skipping", currency);
            }
            total.map(|h| NetWorth {
                currency: currency.clone(),
                market_value: h.market_value,
            })
        })
        .collect()
}

pub fn report_net_worth(ledger: &Ledger) -> Table {
    info!("Generating net worth report");
    let spec = vec![
        Column::text("currency", "Currency", |n: &NetWorth| n.currency.clone()),
        Column::number("net_worth", "Net Worth", |n: &NetWorth| {
            format_optional(n.market_value, format_number)
        }),
    ];
    create_table(&net_worth_rows(ledger), &spec)
}

/// Three-way split of the holdings used by the export, for diagnostics.
pub fn classify_holdings(ledger: &Ledger) -> Classification {
    export::classify(&ledger.holdings, &ledger.tickers)
}

/// Build the portfolio export and its rendered document.
pub fn export_portfolio(
    ledger: &Ledger,
    promiscuous: bool,
    now: NaiveDateTime,
) -> (String, PortfolioExport) {
    info!("Exporting portfolio");

    let morning = export::morning_of(now);
    let options = ExportOptions::from_config(&ledger.config, promiscuous);
    let export = export::build_export(
        &ledger.holdings,
        &ledger.price_map,
        &ledger.tickers,
        &options,
        morning,
    );

    let account = if promiscuous {
        ledger.config.title.as_deref().unwrap_or_default()
    } else {
        ""
    };
    let info = DocumentInfo {
        as_of: morning,
        broker: &ledger.config.export.broker,
        account,
    };
    let document = export::render_document(&export.transactions, &export.securities, &info);
    (document, export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const CONFIG: &str = r#"
title = "Test Ledger"
operating_currency = ["USD", "CAD", "JPY"]

[commodities.HOOL]
ticker = "NASDAQ:HOOL"

[commodities.USD]
ticker = "cash"

[[prices]]
date = "2024-01-02"
currency = "CAD"
quote = "USD"
rate = "0.75"
"#;

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

    fn ledger() -> Ledger {
        let holdings = vec![
            Holding::position(
                "Assets:US:Broker:HOOL",
                dec!(10),
                "HOOL",
                dec!(100),
                "USD",
                Some(dec!(110)),
            ),
            Holding::position(
                "Assets:US:Broker:AAPL",
                dec!(5),
                "AAPL",
                dec!(50),
                "USD",
                Some(dec!(60)),
            ),
            cash("Assets:US:Bank:Checking", dec!(650), "USD"),
            cash("Assets:CA:Bank:Checking", dec!(400), "CAD"),
        ];
        Ledger::new(holdings, Config::from_toml_str(CONFIG).unwrap())
    }

    #[test]
    fn test_relative_without_currency_is_configuration_error() {
        let options = HoldingsReportOptions {
            relative: true,
            ..Default::default()
        };
        let err = report_holdings(&ledger(), &options).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HoldingsError>(),
            Some(HoldingsError::Configuration(_))
        ));
    }

    #[test]
    fn test_plain_report_lists_every_holding() {
        let table = report_holdings(&ledger(), &HoldingsReportOptions::default()).unwrap();
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.headers[0], "Account");
        assert_eq!(table.rows[0][1], "10.00");
        assert_eq!(table.rows[0][7], "1,100.00");
    }

    #[test]
    fn test_relative_report_by_currency() {
        let options = HoldingsReportOptions {
            currency: Some("USD".to_string()),
            relative: true,
            group_by: Some(AggregationKey::Currency),
        };
        let table = report_holdings(&ledger(), &options).unwrap();
        assert_eq!(
            table.headers,
            vec!["Currency", "Cost Currency", "Average Cost", "Price", "Frac Folio"]
        );
        // 1100 + 300 + 650 + 300 (CAD converted) = 2350, all in USD
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][4], "100.00%");
    }

    #[test]
    fn test_root_account_sorted_by_market_value() {
        let rows = holdings_rows(
            &ledger(),
            Some("USD"),
            false,
            Some(&|h: &Holding| AggregationKey::RootAccount.key(h)),
            Some(market_value_or_zero as fn(&Holding) -> Decimal),
        )
        .unwrap();
        let accounts: Vec<_> = rows.iter().map(|h| h.account.as_str()).collect();
        assert_eq!(
            accounts,
            vec!["Assets:US:Broker", "Assets:US:Bank:Checking", "Assets:CA:Bank:Checking"]
        );
        assert_eq!(rows[0].market_value, Some(dec!(1400)));
        assert_eq!(rows[0].number, None);
    }

    #[test]
    fn test_cash_rows() {
        let l = ledger();
        let all_cash = cash_rows(&l, &CashReportOptions::default());
        assert_eq!(all_cash.len(), 2);

        let mut options = CashReportOptions {
            currency: Some("USD".to_string()),
            ..Default::default()
        };
        let converted = cash_rows(&l, &options);
        assert!(converted.iter().all(|h| h.cost_currency.as_deref() == Some("USD")));
        assert_eq!(converted[1].market_value, Some(dec!(300.00)));

        options = CashReportOptions {
            operating_only: true,
            ..Default::default()
        };
        let mut reduced = l.clone();
        reduced.holdings.push(cash("Assets:Wallet", dec!(1), "BTC"));
        assert_eq!(cash_rows(&reduced, &options).len(), 2);

        options.ignored = true;
        let ignored = cash_rows(&reduced, &options);
        assert_eq!(ignored.len(), 3);
        assert!(ignored.iter().any(|h| h.currency.as_deref() == Some("BTC")));
    }

    #[test]
    fn test_net_worth_per_operating_currency() {
        let rows = net_worth_rows(&ledger());
        // JPY has no rates at all and is skipped
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            NetWorth {
                currency: "USD".to_string(),
                market_value: Some(dec!(2350)),
            }
        );
        // 400 + 2050 USD at 1/0.75
        assert_eq!(rows[1].currency, "CAD");
        let cad = rows[1].market_value.unwrap();
        assert!((cad - dec!(3133.33)).abs() < dec!(0.01));
        let table = report_net_worth(&ledger());
        assert_eq!(table.rows[0], vec!["USD", "2,350.00"]);
    }

    #[test]
    fn test_export_portfolio_document() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        let (document, export) = export_portfolio(&ledger(), true, now);

        // HOOL has a ticker; AAPL has none and folds into cash with the bank accounts
        assert_eq!(export.transactions.len(), 2);
        assert!(document.contains("<UNIQUEID>NASDAQ:HOOL"));
        assert!(document.contains("<MEMO>Assets:US:Broker:HOOL"));
        assert!(document.contains("<ACCTID>Test Ledger"));
        assert!(document.contains("<DTSERVER>20240510090000.000"));
        assert!(document.contains("<DTTRADE>20240508090000.000"));
        // 300 (AAPL) + 650 (USD) + 300 (CAD)
        assert!(document.contains(
            "<UNIQUEID>VMMXX\n<UNIQUEIDTYPE>TICKER\n</SECID>\n<UNITS>1250.00"
        ));
        assert!(export.classification.ignored_commodities.contains("AAPL"));
    }

    #[test]
    fn test_classify_holdings() {
        let classification = classify_holdings(&ledger());
        assert_eq!(classification.exportable.len(), 1);
        assert_eq!(classification.cashlike.len(), 1);
        assert_eq!(classification.ignored.len(), 2);
    }
}
