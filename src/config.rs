//! Pipeline configuration.
//!
//! Every tunable lives here as a named default and can be overridden from a
//! TOML file:
//!
//! ```toml
//! [gainers]
//! limit = 10
//! positive_only = false
//!
//! [similarity]
//! k = 5
//! type_scope = "same_type"
//! weights = { price = 1.0, market_cap = 1.0, change_24h = 2.0 }
//!
//! [filter]
//! types = ["Coin", "Meme"]
//! max_price = 1000.0
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::FilterCriteria;
use crate::error::PipelineError;

/// Number of coins shown in the top-gainers view.
pub const DEFAULT_TOP_GAINERS: usize = 10;

/// Number of neighbours returned by the similarity engine.
pub const DEFAULT_SIMILAR_K: usize = 5;

/// Upper price bound of the default filter.
pub const DEFAULT_MAX_PRICE: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Gainers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainerConfig {
    pub limit: usize,
    /// When set, only coins with a strictly positive 24h change qualify.
    /// Otherwise the top `limit` by change are returned whatever their sign.
    pub positive_only: bool,
}

impl Default for GainerConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_GAINERS,
            positive_only: false,
        }
    }
}

impl GainerConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.limit == 0 {
            return Err(PipelineError::InvalidLimit {
                what: "top gainers",
                value: self.limit,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

/// Whether the coin type restricts similarity candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeScope {
    /// Type is ignored; every other coin is a candidate.
    #[default]
    AnyType,
    /// Only coins sharing the reference's type are candidates, and only they
    /// contribute to the normalisation bounds.
    SameType,
}

/// Fixed per-dimension weights for the distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub price: f64,
    pub market_cap: f64,
    pub change_24h: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            price: 1.0,
            market_cap: 1.0,
            change_24h: 1.0,
        }
    }
}

impl FeatureWeights {
    /// Weights in feature-vector order.
    pub fn as_array(&self) -> [f64; 3] {
        [self.price, self.market_cap, self.change_24h]
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let weights = self.as_array();
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(PipelineError::InvalidWeights {
                reason: format!("weights must be finite and non-negative, got {bad}"),
            });
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err(PipelineError::InvalidWeights {
                reason: "at least one weight must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub k: usize,
    pub type_scope: TypeScope,
    pub weights: FeatureWeights,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_SIMILAR_K,
            type_scope: TypeScope::default(),
            weights: FeatureWeights::default(),
        }
    }
}

impl SimilarityConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.k == 0 {
            return Err(PipelineError::InvalidLimit {
                what: "similar coins",
                value: self.k,
            });
        }
        self.weights.validate()
    }
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub gainers: GainerConfig,
    pub similarity: SimilarityConfig,
    /// Criteria applied when the caller supplies none.
    pub filter: FilterCriteria,
}

impl PipelineConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig = toml::from_str(text).map_err(|e| PipelineError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.gainers.validate()?;
        self.similarity.validate()?;
        self.filter.validate()
    }
}
