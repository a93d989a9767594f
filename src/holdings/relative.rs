use rust_decimal::Decimal;

use super::Holding;

/// Replace market values with their fraction of the portfolio total.
///
/// Book value and units are dropped so that an absolute portfolio value
/// cannot be rebuilt from fraction, price and average cost. When the
/// total is zero every fraction is absent.
pub fn reduce_relative(holdings: &[Holding]) -> Vec<Holding> {
    let total: Decimal = holdings.iter().filter_map(|h| h.market_value).sum();

    holdings
        .iter()
        .map(|holding| Holding {
            number: None,
            book_value: None,
            market_value: match holding.market_value {
                Some(value) if !total.is_zero() => Some(value / total),
                _ => None,
            },
            ..holding.clone()
        })
        .collect()
}
