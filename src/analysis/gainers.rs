use std::cmp::Ordering;

use crate::config::GainerConfig;
use crate::data::{CoinRecord, Dataset};
use crate::error::PipelineError;

/// Top `limit` coins by 24h change, whatever the sign of the change.
pub fn top_gainers(dataset: &Dataset, limit: usize) -> Result<Dataset, PipelineError> {
    top_gainers_with(
        dataset,
        &GainerConfig {
            limit,
            positive_only: false,
        },
    )
}

/// Rank coins by 24h change according to `config`.
///
/// Order: `change_24h` descending, then `market_cap` descending, then
/// `symbol` ascending. Fewer than `limit` qualifying coins yields them all.
pub fn top_gainers_with(dataset: &Dataset, config: &GainerConfig) -> Result<Dataset, PipelineError> {
    config.validate()?;

    let mut ranked: Vec<&CoinRecord> = dataset
        .iter()
        .filter(|c| !config.positive_only || c.change_24h > 0.0)
        .collect();
    ranked.sort_by(|a, b| gainer_order(a, b));

    Ok(ranked.into_iter().take(config.limit).cloned().collect())
}

/// Total order used for the gainers view.
pub fn gainer_order(a: &CoinRecord, b: &CoinRecord) -> Ordering {
    // Adding 0.0 folds -0.0 into 0.0 so signed zeros still tie.
    (b.change_24h + 0.0)
        .total_cmp(&(a.change_24h + 0.0))
        .then_with(|| (b.market_cap + 0.0).total_cmp(&(a.market_cap + 0.0)))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::coin;
    use crate::data::{build, CoinType, RawCoinRecord, RawValue};

    fn symbols(ds: &Dataset) -> Vec<&str> {
        ds.iter().map(|c| c.symbol.as_str()).collect()
    }

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            coin("BTC", 50_000.0, 1e12, 2.0, CoinType::Coin),
            coin("ETH", 3_000.0, 4e11, 1.0, CoinType::Coin),
            coin("DOGE", 0.1, 1.5e10, 10.0, CoinType::Meme),
            coin("XRP", 0.5, 3e10, -4.0, CoinType::Coin),
        ])
    }

    #[test]
    fn orders_by_change_descending() {
        let ranked = top_gainers(&sample(), 10).unwrap();
        assert_eq!(symbols(&ranked), vec!["DOGE", "BTC", "ETH", "XRP"]);
    }

    #[test]
    fn truncates_to_limit() {
        assert_eq!(symbols(&top_gainers(&sample(), 1).unwrap()), vec!["DOGE"]);
    }

    #[test]
    fn ties_break_on_cap_then_symbol() {
        let ds = Dataset::from_records(vec![
            coin("BBB", 1.0, 10.0, 5.0, CoinType::Token),
            coin("AAA", 1.0, 10.0, 5.0, CoinType::Token),
            coin("CCC", 1.0, 20.0, 5.0, CoinType::Token),
        ]);
        assert_eq!(symbols(&top_gainers(&ds, 3).unwrap()), vec!["CCC", "AAA", "BBB"]);
    }

    #[test]
    fn signed_zero_changes_tie_on_market_cap() {
        let raw = |symbol: &str, change: &str, cap: f64| RawCoinRecord {
            name: symbol.into(),
            symbol: symbol.into(),
            price: RawValue::Float(1.0),
            market_cap: RawValue::Float(cap),
            change_24h: change.into(),
            ..Default::default()
        };
        let ds = build(&[raw("AAA", "0.00", 1.0), raw("BBB", "-0.00", 100.0)]);
        assert_eq!(symbols(&top_gainers(&ds, 2).unwrap()), vec!["BBB", "AAA"]);

        let direct = Dataset::from_records(vec![
            coin("AAA", 1.0, 1.0, 0.0, CoinType::Coin),
            coin("BBB", 1.0, 100.0, -0.0, CoinType::Coin),
        ]);
        assert_eq!(symbols(&top_gainers(&direct, 2).unwrap()), vec!["BBB", "AAA"]);
    }

    #[test]
    fn negative_movers_fill_short_lists() {
        let ds = Dataset::from_records(vec![
            coin("UP", 1.0, 1.0, 3.0, CoinType::Coin),
            coin("DOWN", 1.0, 1.0, -3.0, CoinType::Coin),
        ]);
        assert_eq!(symbols(&top_gainers(&ds, 5).unwrap()), vec!["UP", "DOWN"]);

        let strict = GainerConfig {
            limit: 5,
            positive_only: true,
        };
        assert_eq!(symbols(&top_gainers_with(&ds, &strict).unwrap()), vec!["UP"]);
    }

    #[test]
    fn zero_limit_is_an_error() {
        assert!(matches!(
            top_gainers(&sample(), 0),
            Err(PipelineError::InvalidLimit { .. })
        ));
    }

    #[test]
    fn empty_dataset() {
        assert!(top_gainers(&Dataset::default(), 3).unwrap().is_empty());
    }
}
