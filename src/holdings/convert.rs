use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::Holding;
use crate::pricing::PriceMap;

/// Convert the valuation of each holding into `target_currency`.
///
/// The rate is the one in effect on the holding's price date, or the latest
/// known rate for undated holdings and dates before the first quote.
/// Holdings already valued in the target pass through untouched. Holdings
/// without a cost currency are treated as priced in their own units. When
/// the price map has no rate, the original holding is kept as-is; partial
/// price coverage is expected and never an error.
pub fn convert_to_currency(
    price_map: &PriceMap,
    target_currency: &str,
    holdings: &[Holding],
) -> Vec<Holding> {
    holdings
        .iter()
        .map(|holding| convert_holding(price_map, target_currency, holding))
        .collect()
}

fn convert_holding(price_map: &PriceMap, target_currency: &str, holding: &Holding) -> Holding {
    if holding.cost_currency.as_deref() == Some(target_currency) {
        return holding.clone();
    }

    let priced = match (&holding.cost_currency, &holding.currency) {
        (Some(_), _) => holding.clone(),
        (None, Some(currency)) => Holding {
            cost_currency: Some(currency.clone()),
            book_value: holding.book_value.or(holding.number),
            market_value: holding.market_value.or(holding.number),
            ..holding.clone()
        },
        (None, None) => {
            debug!("Holding in {} has no currency to convert from", holding.account);
            return holding.clone();
        }
    };

    let cost_currency = priced.cost_currency.as_deref().unwrap_or_default();
    match conversion_rate(price_map, cost_currency, target_currency, priced.price_date) {
        Some(rate) => {
            let scale = |value: Option<Decimal>| value.map(|number| number * rate);
            Holding {
                cost_currency: Some(target_currency.to_string()),
                cost_number: scale(priced.cost_number),
                price_number: scale(priced.price_number),
                book_value: scale(priced.book_value),
                market_value: scale(priced.market_value),
                ..priced
            }
        }
        None => {
            debug!(
                "No rate {} -> {}; leaving {} unconverted",
                cost_currency, target_currency, holding.account
            );
            holding.clone()
        }
    }
}

fn conversion_rate(
    price_map: &PriceMap,
    base: &str,
    quote: &str,
    as_of: Option<NaiveDate>,
) -> Option<Decimal> {
    as_of
        .and_then(|date| price_map.get_price(base, quote, date))
        .or_else(|| price_map.get_latest_price(base, quote).map(|(_, rate)| rate))
}
