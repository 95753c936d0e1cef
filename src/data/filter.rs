use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{CoinRecord, CoinType, Dataset};
use crate::config::DEFAULT_MAX_PRICE;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Filter predicate
// ---------------------------------------------------------------------------

/// User-selected filter predicates.
///
/// An empty `types` selection hides everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub types: BTreeSet<CoinType>,
    pub min_price: f64,
    pub max_price: f64,
    pub min_market_cap: f64,
}

impl Default for FilterCriteria {
    /// All types selected, price in `[0, DEFAULT_MAX_PRICE]`, no cap floor.
    fn default() -> Self {
        Self {
            types: CoinType::ALL.into_iter().collect(),
            min_price: 0.0,
            max_price: DEFAULT_MAX_PRICE,
            min_market_cap: 0.0,
        }
    }
}

impl FilterCriteria {
    /// Reject bounds that could only produce nonsense.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (label, value) in [
            ("min_price", self.min_price),
            ("max_price", self.max_price),
            ("min_market_cap", self.min_market_cap),
        ] {
            if !value.is_finite() {
                return Err(PipelineError::criteria(format!(
                    "{label} must be a finite number, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(PipelineError::criteria(format!(
                    "{label} must not be negative, got {value}"
                )));
            }
        }
        if self.min_price > self.max_price {
            return Err(PipelineError::criteria(format!(
                "min_price {} is greater than max_price {}",
                self.min_price, self.max_price
            )));
        }
        Ok(())
    }

    /// Whether a single coin passes every predicate.
    pub fn matches(&self, coin: &CoinRecord) -> bool {
        self.types.contains(&coin.coin_type)
            && coin.price >= self.min_price
            && coin.price <= self.max_price
            && coin.market_cap >= self.min_market_cap
    }
}

/// Return the coins that pass `criteria`, in their original order.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Result<Dataset, PipelineError> {
    criteria.validate()?;
    Ok(dataset
        .iter()
        .filter(|coin| criteria.matches(coin))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::coin;

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            coin("BTC", 50_000.0, 1e12, 2.0, CoinType::Coin),
            coin("ETH", 3_000.0, 4e11, 1.0, CoinType::Coin),
            coin("DOGE", 0.1, 1.5e10, 10.0, CoinType::Meme),
            coin("USDT", 1.0, 8e10, 0.0, CoinType::Stablecoin),
        ])
    }

    fn symbols(ds: &Dataset) -> Vec<&str> {
        ds.iter().map(|c| c.symbol.as_str()).collect()
    }

    #[test]
    fn filters_by_type_and_keeps_order() {
        let criteria = FilterCriteria {
            types: [CoinType::Coin].into(),
            min_price: 0.0,
            max_price: 100_000.0,
            min_market_cap: 0.0,
        };
        assert_eq!(symbols(&filter(&sample(), &criteria).unwrap()), vec!["BTC", "ETH"]);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let criteria = FilterCriteria {
            min_price: 1.0,
            max_price: 3_000.0,
            ..Default::default()
        };
        assert_eq!(symbols(&filter(&sample(), &criteria).unwrap()), vec!["ETH", "USDT"]);
    }

    #[test]
    fn market_cap_floor() {
        let criteria = FilterCriteria {
            min_market_cap: 8e10,
            ..Default::default()
        };
        assert_eq!(symbols(&filter(&sample(), &criteria).unwrap()), vec!["BTC", "ETH", "USDT"]);
    }

    #[test]
    fn empty_type_selection_hides_everything() {
        let criteria = FilterCriteria {
            types: BTreeSet::new(),
            ..Default::default()
        };
        assert!(filter(&sample(), &criteria).unwrap().is_empty());
    }

    #[test]
    fn default_criteria_match_everything_reasonable() {
        assert_eq!(filter(&sample(), &FilterCriteria::default()).unwrap().len(), 4);
    }

    #[test]
    fn invalid_criteria_fail_fast() {
        let inverted = FilterCriteria {
            min_price: 10.0,
            max_price: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            filter(&sample(), &inverted),
            Err(PipelineError::InvalidCriteria { .. })
        ));

        let nan = FilterCriteria {
            min_market_cap: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let negative = FilterCriteria {
            min_price: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn filtering_twice_is_stable() {
        let criteria = FilterCriteria {
            types: [CoinType::Coin, CoinType::Meme].into(),
            min_market_cap: 1e10,
            ..Default::default()
        };
        let once = filter(&sample(), &criteria).unwrap();
        let twice = filter(&once, &criteria).unwrap();
        assert_eq!(once, twice);
    }
}
