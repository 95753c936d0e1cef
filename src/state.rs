use log::info;
use serde::Serialize;

use crate::analysis::{find_similar_with, top_gainers_with, SimilarityResult};
use crate::config::PipelineConfig;
use crate::data::{
    build_with_report, filter, BuildReport, CoinRecord, Dataset, FilterCriteria, RawCoinRecord,
};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Refresh snapshot
// ---------------------------------------------------------------------------

/// Everything the views need after one refresh. Never mutated: a new filter
/// or a new batch of raw records produces a new snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSnapshot {
    /// All valid coins.
    pub dataset: Dataset,
    /// Coins matching `criteria`.
    pub filtered: Dataset,
    /// Top gainers over the full dataset; also the pool a selection comes from.
    pub gainers: Dataset,
    pub criteria: FilterCriteria,
    #[serde(skip)]
    pub report: BuildReport,
}

/// A chosen gainer together with its nearest neighbours.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub reference: CoinRecord,
    pub similar: SimilarityResult,
}

impl RefreshSnapshot {
    /// Run the whole pipeline over a fresh batch of raw records.
    pub fn refresh(
        raw: &[RawCoinRecord],
        config: &PipelineConfig,
        criteria: &FilterCriteria,
    ) -> Result<Self, PipelineError> {
        // Check everything before doing any work.
        config.gainers.validate()?;
        criteria.validate()?;

        info!("Processing {} raw records", raw.len());
        let (dataset, report) = build_with_report(raw);
        info!("Processed {} valid cryptocurrencies", dataset.len());

        let filtered = filter(&dataset, criteria)?;
        info!("Filtered to {} cryptocurrencies", filtered.len());

        let gainers = top_gainers_with(&dataset, &config.gainers)?;
        info!("Selected {} top gainers", gainers.len());

        Ok(RefreshSnapshot {
            dataset,
            filtered,
            gainers,
            criteria: criteria.clone(),
            report,
        })
    }

    /// Re-apply a different filter to the same dataset.
    pub fn refilter(&self, criteria: &FilterCriteria) -> Result<Self, PipelineError> {
        let filtered = filter(&self.dataset, criteria)?;
        info!("Filtered to {} cryptocurrencies", filtered.len());
        Ok(RefreshSnapshot {
            filtered,
            criteria: criteria.clone(),
            ..self.clone()
        })
    }

    /// Recommend coins similar to the gainer with `symbol`.
    ///
    /// Neighbours are searched over the full dataset, not the filtered view.
    pub fn recommend(
        &self,
        symbol: &str,
        config: &PipelineConfig,
    ) -> Result<Recommendation, PipelineError> {
        let reference = self
            .gainers
            .find_by_symbol(symbol)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownSelection {
                symbol: symbol.trim().to_string(),
            })?;
        info!("Selected coin: {}", reference.name);

        let similar = find_similar_with(&reference, &self.dataset, &config.similarity)?;
        info!("Found {} similar coins", similar.len());

        Ok(Recommendation { reference, similar })
    }
}
