use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Value as JsonValue};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// (symbol, name, category, tags, base price, circulating supply)
const UNIVERSE: &[(&str, &str, &str, &str, f64, f64)] = &[
    ("BTC", "Bitcoin", "coin", "mineable;pow", 50_000.0, 19.6e6),
    ("ETH", "Ethereum", "coin", "pos;smart-contracts", 3_000.0, 120e6),
    ("SOL", "Solana", "coin", "layer-1", 140.0, 440e6),
    ("USDT", "Tether", "stablecoin", "stablecoin", 1.0, 110e9),
    ("USDC", "USD Coin", "stablecoin", "stablecoin", 1.0, 33e9),
    ("UNI", "Uniswap", "defi", "defi;dex", 7.5, 600e6),
    ("AAVE", "Aave", "defi", "defi;lending-borrowing", 90.0, 14.8e6),
    ("DOGE", "Dogecoin", "meme", "memes", 0.1, 143e9),
    ("SHIB", "Shiba Inu", "meme", "memes", 0.00002, 589e12),
    ("PEPE", "Pepe", "meme", "memes", 0.000008, 420e12),
    ("ARB", "Arbitrum", "layer-2", "layer-2", 1.1, 2.9e9),
    ("OP", "Optimism", "layer-2", "layer-2;scaling", 2.3, 1.1e9),
    ("APE", "ApeCoin", "nft", "collectibles-nfts", 1.4, 600e6),
    ("LINK", "Chainlink", "token", "oracles", 14.0, 587e6),
    ("XMR", "Monero", "privacy", "mineable;privacy", 160.0, 18.4e6),
];

struct Row {
    id: String,
    name: String,
    symbol: String,
    price: Option<f64>,
    market_cap: Option<f64>,
    change_24h: f64,
    volume_24h: f64,
    category: String,
    tags: String,
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows: Vec<Row> = UNIVERSE
        .iter()
        .map(|&(symbol, name, category, tags, base, supply)| {
            // Stablecoins stay pegged; everything else drifts up to ±8%.
            let is_stable = tags.contains("stablecoin");
            let drift = if is_stable { rng.range(-0.002, 0.002) } else { rng.range(-0.08, 0.08) };
            let price = base * (1.0 + drift);
            Row {
                id: name.to_ascii_lowercase().replace(' ', "-"),
                name: name.to_string(),
                symbol: symbol.to_string(),
                price: Some(price),
                market_cap: Some(price * supply),
                change_24h: drift * 100.0,
                volume_24h: price * supply * rng.range(0.01, 0.2),
                category: category.to_string(),
                tags: tags.to_string(),
            }
        })
        .collect();

    // A few rows the builder is expected to drop.
    rows.push(Row {
        id: "ghost".into(),
        name: "Ghost Token".into(),
        symbol: "GHOST".into(),
        price: None,
        market_cap: Some(1.0e6),
        change_24h: 12.0,
        volume_24h: 0.0,
        category: "token".into(),
        tags: String::new(),
    });
    rows.push(Row {
        id: "broken-cap".into(),
        name: "Broken Cap".into(),
        symbol: "BRKN".into(),
        price: Some(0.5),
        market_cap: Some(-10.0),
        change_24h: 3.0,
        volume_24h: 100.0,
        category: "token".into(),
        tags: String::new(),
    });
    rows.push(Row {
        id: "bitcoin-relisted".into(),
        name: "Bitcoin (relisted)".into(),
        symbol: "btc".into(),
        price: Some(1.0),
        market_cap: Some(1.0),
        change_24h: 99.0,
        volume_24h: 1.0,
        category: "coin".into(),
        tags: String::new(),
    });

    rows
}

fn text_column(rows: &[Row], f: impl Fn(&Row) -> &str) -> StringArray {
    StringArray::from(rows.iter().map(f).collect::<Vec<_>>())
}

fn write_parquet(rows: &[Row], output_path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("symbol", DataType::Utf8, false),
        Field::new("price", DataType::Float64, true),
        Field::new("market_cap", DataType::Float64, true),
        Field::new("percent_change_24h", DataType::Float64, false),
        Field::new("volume_24h", DataType::Float64, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("tags", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text_column(rows, |r| r.id.as_str())),
            Arc::new(text_column(rows, |r| r.name.as_str())),
            Arc::new(text_column(rows, |r| r.symbol.as_str())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.price).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.market_cap).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.change_24h).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.volume_24h).collect::<Vec<_>>())),
            Arc::new(text_column(rows, |r| r.category.as_str())),
            Arc::new(text_column(rows, |r| r.tags.as_str())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(output_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Same rows as a CoinMarketCap-style listing.
fn write_json(rows: &[Row], output_path: &str) -> Result<()> {
    let data: Vec<JsonValue> = rows
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "name": r.name,
                "symbol": r.symbol,
                "category": r.category,
                "tags": r.tags.split(';').filter(|t| !t.is_empty()).collect::<Vec<_>>(),
                "quote": { "USD": {
                    "price": r.price,
                    "market_cap": r.market_cap,
                    "percent_change_24h": r.change_24h,
                    "volume_24h": r.volume_24h,
                } }
            })
        })
        .collect();

    let file = std::fs::File::create(output_path).context("creating JSON output")?;
    serde_json::to_writer_pretty(file, &json!({ "data": data })).context("writing JSON")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    write_parquet(&rows, "sample_coins.parquet")?;
    write_json(&rows, "sample_coins.json")?;

    println!(
        "Wrote {} coins to sample_coins.parquet and sample_coins.json",
        rows.len()
    );
    Ok(())
}
