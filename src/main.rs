use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use coin_radar::config::TypeScope;
use coin_radar::data::{loader, CoinType};
use coin_radar::{PipelineConfig, Recommendation, RefreshSnapshot};

#[derive(Parser)]
#[command(version, about = "Filter a crypto market snapshot, rank gainers and find similar coins")]
struct Cli {
    /// Raw market snapshot (.json, .csv or .parquet)
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Comma-separated coin types to keep (e.g. "Coin,Meme"); default: all
    #[arg(long, value_delimiter = ',')]
    types: Option<Vec<CoinType>>,

    #[arg(long)]
    min_price: Option<f64>,

    #[arg(long)]
    max_price: Option<f64>,

    #[arg(long)]
    min_market_cap: Option<f64>,

    /// Number of top gainers
    #[arg(long)]
    top: Option<usize>,

    /// Number of similar coins to recommend
    #[arg(long)]
    neighbours: Option<usize>,

    /// Only compare coins of the selected coin's type
    #[arg(long)]
    same_type: bool,

    /// Only rank coins with a positive 24h change
    #[arg(long)]
    positive_only: bool,

    /// Symbol of a top gainer to recommend similar coins for
    #[arg(long, value_name = "SYMBOL")]
    select: Option<String>,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    snapshot: &'a RefreshSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<Recommendation>,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(types) = &self.types {
            config.filter.types = types.iter().copied().collect::<BTreeSet<_>>();
        }
        if let Some(v) = self.min_price {
            config.filter.min_price = v;
        }
        if let Some(v) = self.max_price {
            config.filter.max_price = v;
        }
        if let Some(v) = self.min_market_cap {
            config.filter.min_market_cap = v;
        }
        if let Some(n) = self.top {
            config.gainers.limit = n;
        }
        if let Some(k) = self.neighbours {
            config.similarity.k = k;
        }
        if self.same_type {
            config.similarity.type_scope = TypeScope::SameType;
        }
        if self.positive_only {
            config.gainers.positive_only = true;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;

    let raw = loader::load_file(&cli.input)?;
    let snapshot = RefreshSnapshot::refresh(&raw, &config, &config.filter)?;

    if snapshot.filtered.is_empty() {
        log::warn!("No cryptocurrencies match the current filters");
    }
    if snapshot.gainers.is_empty() {
        log::warn!("No top gainers available for recommendations");
    }

    let recommendation = cli
        .select
        .as_deref()
        .map(|symbol| snapshot.recommend(symbol, &config))
        .transpose()?;

    let output = Output {
        snapshot: &snapshot,
        recommendation,
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &output).context("writing output")?;
    writeln!(out)?;
    Ok(())
}
