use log::debug;
use serde::Serialize;

use crate::config::{FeatureWeights, SimilarityConfig, TypeScope};
use crate::data::{CoinRecord, Dataset};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMatch {
    pub coin: CoinRecord,
    pub distance: f64,
}

/// Closest coins to a reference, ascending by distance. Never contains the
/// reference itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub reference_symbol: String,
    pub matches: Vec<SimilarMatch>,
}

impl SimilarityResult {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.coin.symbol.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Min-max bounds
// ---------------------------------------------------------------------------

/// Per-feature min / max over a set of coins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBounds {
    min: [f64; 3],
    max: [f64; 3],
}

impl FeatureBounds {
    /// `None` for an empty set.
    pub fn from_coins<'a>(coins: impl IntoIterator<Item = &'a CoinRecord>) -> Option<Self> {
        let mut coins = coins.into_iter();
        let first = coins.next()?.features();
        let mut bounds = FeatureBounds {
            min: first,
            max: first,
        };
        for coin in coins {
            for (i, v) in coin.features().into_iter().enumerate() {
                bounds.min[i] = bounds.min[i].min(v);
                bounds.max[i] = bounds.max[i].max(v);
            }
        }
        Some(bounds)
    }

    /// Min-max scale a coin's features. A zero-variance feature scales to 0.
    ///
    /// Works on halved values so `max - min` cannot overflow when a feature
    /// spans both signs.
    pub fn scale(&self, coin: &CoinRecord) -> [f64; 3] {
        let mut scaled = [0.0; 3];
        for (i, v) in coin.features().into_iter().enumerate() {
            let (lo, hi) = (self.min[i] / 2.0, self.max[i] / 2.0);
            let half_range = hi - lo;
            if half_range > 0.0 {
                scaled[i] = (v / 2.0 - lo) / half_range;
            }
        }
        scaled
    }
}

fn weighted_distance(a: &[f64; 3], b: &[f64; 3], weights: &FeatureWeights) -> f64 {
    a.iter()
        .zip(b)
        .zip(weights.as_array())
        .filter(|(_, w)| *w > 0.0)
        .map(|((x, y), w)| w * (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// The `k` coins closest to `reference`, type ignored, equal weights.
pub fn find_similar(
    reference: &CoinRecord,
    dataset: &Dataset,
    k: usize,
) -> Result<SimilarityResult, PipelineError> {
    find_similar_with(
        reference,
        dataset,
        &SimilarityConfig {
            k,
            ..Default::default()
        },
    )
}

/// Nearest neighbours of `reference` in scaled (price, market cap, 24h change)
/// space.
///
/// Bounds come from the scoped dataset as given; the reference need not be a
/// member and is scaled with the same bounds. Ties in distance are broken by
/// symbol.
pub fn find_similar_with(
    reference: &CoinRecord,
    dataset: &Dataset,
    config: &SimilarityConfig,
) -> Result<SimilarityResult, PipelineError> {
    config.validate()?;

    let pool: Vec<&CoinRecord> = dataset
        .iter()
        .filter(|c| match config.type_scope {
            TypeScope::AnyType => true,
            TypeScope::SameType => c.coin_type == reference.coin_type,
        })
        .collect();

    let mut result = SimilarityResult {
        reference_symbol: reference.symbol.clone(),
        matches: Vec::new(),
    };

    let Some(bounds) = FeatureBounds::from_coins(pool.iter().copied()) else {
        debug!("No coins in scope for {}", reference.symbol);
        return Ok(result);
    };
    let origin = bounds.scale(reference);

    let mut matches: Vec<SimilarMatch> = pool
        .into_iter()
        .filter(|c| !c.symbol.eq_ignore_ascii_case(&reference.symbol))
        .map(|c| SimilarMatch {
            distance: weighted_distance(&origin, &bounds.scale(c), &config.weights),
            coin: c.clone(),
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.coin.symbol.cmp(&b.coin.symbol))
    });
    matches.truncate(config.k);

    debug!(
        "{} similar coins for {} (scope {:?})",
        matches.len(),
        reference.symbol,
        config.type_scope
    );
    result.matches = matches;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::coin;
    use crate::data::CoinType;

    fn btc() -> CoinRecord {
        coin("BTC", 50_000.0, 1e12, 2.0, CoinType::Coin)
    }

    fn eth() -> CoinRecord {
        coin("ETH", 3_000.0, 4e11, 1.0, CoinType::Coin)
    }

    fn doge() -> CoinRecord {
        coin("DOGE", 0.1, 1.5e10, 10.0, CoinType::Meme)
    }

    #[test]
    fn eth_is_closest_to_btc_without_btc_in_dataset() {
        let ds = Dataset::from_records(vec![eth(), doge()]);
        let result = find_similar(&btc(), &ds, 1).unwrap();
        assert_eq!(result.symbols(), vec!["ETH"]);
        assert_eq!(result.reference_symbol, "BTC");
    }

    #[test]
    fn reference_is_excluded_and_order_ascending() {
        let ds = Dataset::from_records(vec![btc(), eth(), doge()]);
        let result = find_similar(&btc(), &ds, 5).unwrap();
        assert_eq!(result.symbols(), vec!["ETH", "DOGE"]);
        assert!(result.matches[0].distance <= result.matches[1].distance);
    }

    #[test]
    fn zero_variance_feature_contributes_nothing() {
        let ds = Dataset::from_records(vec![
            coin("AAA", 5.0, 0.0, 0.0, CoinType::Token),
            coin("CCC", 5.0, 0.0, 10.0, CoinType::Token),
            coin("BBB", 5.0, 10.0, 0.0, CoinType::Token),
        ]);
        let reference = ds.find_by_symbol("AAA").unwrap().clone();
        let result = find_similar(&reference, &ds, 5).unwrap();
        assert_eq!(result.symbols(), vec!["BBB", "CCC"]);
        for m in &result.matches {
            assert!((m.distance - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn extreme_changes_keep_distances_finite() {
        let ds = Dataset::from_records(vec![
            coin("REF", 1.0, 1.0, 0.0, CoinType::Coin),
            coin("HI", 1.0, 1.0, 1e308, CoinType::Coin),
            coin("LO", 1.0, 1.0, -1e308, CoinType::Coin),
            coin("NEAR", 1.0, 1.0, 1.0, CoinType::Coin),
        ]);
        let reference = ds.find_by_symbol("REF").unwrap().clone();
        let result = find_similar(&reference, &ds, 3).unwrap();
        assert_eq!(result.symbols(), vec!["NEAR", "HI", "LO"]);
        assert!(result.matches.iter().all(|m| m.distance.is_finite()));

        let bounds = FeatureBounds::from_coins(&ds).unwrap();
        assert_eq!(bounds.scale(&ds.records()[1])[2], 1.0);
        assert_eq!(bounds.scale(&ds.records()[2])[2], 0.0);
    }

    #[test]
    fn identical_vectors_tie_break_on_symbol() {
        let ds = Dataset::from_records(vec![
            coin("ZED", 1.0, 1.0, 1.0, CoinType::Coin),
            coin("ABC", 1.0, 1.0, 1.0, CoinType::Coin),
            coin("REF", 1.0, 1.0, 1.0, CoinType::Coin),
        ]);
        let reference = ds.find_by_symbol("REF").unwrap().clone();
        let result = find_similar(&reference, &ds, 5).unwrap();
        assert_eq!(result.symbols(), vec!["ABC", "ZED"]);
        assert!(result.matches.iter().all(|m| m.distance == 0.0));
    }

    #[test]
    fn same_type_scope_restricts_candidates() {
        let ds = Dataset::from_records(vec![btc(), eth(), doge()]);
        let config = SimilarityConfig {
            k: 5,
            type_scope: TypeScope::SameType,
            ..Default::default()
        };
        let result = find_similar_with(&doge(), &ds, &config).unwrap();
        assert!(result.is_empty());

        let result = find_similar_with(&btc(), &ds, &config).unwrap();
        assert_eq!(result.symbols(), vec!["ETH"]);
    }

    #[test]
    fn weights_change_the_ranking() {
        let reference = coin("REF", 0.0, 0.0, 0.0, CoinType::Coin);
        let ds = Dataset::from_records(vec![
            reference.clone(),
            coin("PRICEY", 10.0, 0.0, 0.0, CoinType::Coin),
            coin("MOVER", 0.0, 0.0, 8.0, CoinType::Coin),
        ]);
        let equal = find_similar(&reference, &ds, 2).unwrap();
        assert_eq!(equal.symbols(), vec!["MOVER", "PRICEY"]);

        let config = SimilarityConfig {
            k: 2,
            weights: FeatureWeights {
                price: 1.0,
                market_cap: 1.0,
                change_24h: 4.0,
            },
            ..Default::default()
        };
        let weighted = find_similar_with(&reference, &ds, &config).unwrap();
        assert_eq!(weighted.symbols(), vec!["PRICEY", "MOVER"]);
    }

    #[test]
    fn only_reference_gives_empty_result() {
        let ds = Dataset::from_records(vec![btc()]);
        assert!(find_similar(&btc(), &ds, 3).unwrap().is_empty());
        assert!(find_similar(&btc(), &Dataset::default(), 3).unwrap().is_empty());
    }

    #[test]
    fn k_truncates_and_zero_is_rejected() {
        let ds = Dataset::from_records(vec![btc(), eth(), doge()]);
        assert_eq!(find_similar(&doge(), &ds, 1).unwrap().len(), 1);
        assert!(matches!(
            find_similar(&doge(), &ds, 0),
            Err(PipelineError::InvalidLimit { .. })
        ));
    }

    #[test]
    fn bounds_scale_into_unit_range() {
        let ds = Dataset::from_records(vec![btc(), eth(), doge()]);
        let bounds = FeatureBounds::from_coins(&ds).unwrap();
        assert_eq!(bounds.scale(&btc())[0], 1.0);
        assert_eq!(bounds.scale(&doge())[0], 0.0);
        assert_eq!(bounds.scale(&doge())[2], 1.0);
        assert!(FeatureBounds::from_coins(&Dataset::default()).is_none());
    }
}
