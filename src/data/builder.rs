use std::collections::HashSet;

use log::{debug, info};

use super::model::{CoinRecord, CoinType, Dataset, RawCoinRecord, RawValue};

// ---------------------------------------------------------------------------
// Build report
// ---------------------------------------------------------------------------

/// Counts gathered while building one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Validate raw provider rows into a clean [`Dataset`].
///
/// Bad rows are skipped, never fatal. An empty or fully rejected input
/// produces an empty dataset.
pub fn build(raw_records: &[RawCoinRecord]) -> Dataset {
    build_with_report(raw_records).0
}

/// Same as [`build`], also returning accept / reject / duplicate counts.
pub fn build_with_report(raw_records: &[RawCoinRecord]) -> (Dataset, BuildReport) {
    let mut report = BuildReport::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(raw_records.len());
    let mut records = Vec::with_capacity(raw_records.len());

    for (row, raw) in raw_records.iter().enumerate() {
        let record = match validate(raw) {
            Ok(record) => record,
            Err(reason) => {
                debug!("Row {row}: rejected ({reason})");
                report.rejected += 1;
                continue;
            }
        };

        if !seen.insert(record.symbol.clone()) {
            debug!("Row {row}: duplicate symbol {} skipped", record.symbol);
            report.duplicates += 1;
            continue;
        }

        records.push(record);
    }

    report.accepted = records.len();
    info!(
        "Built dataset: {} accepted, {} rejected, {} duplicates",
        report.accepted, report.rejected, report.duplicates
    );

    (Dataset::from_records(records), report)
}

// ---------------------------------------------------------------------------
// Per-row validation
// ---------------------------------------------------------------------------

fn validate(raw: &RawCoinRecord) -> Result<CoinRecord, String> {
    let name = raw.name.to_text().ok_or("missing name")?;
    let symbol = raw
        .symbol
        .to_text()
        .ok_or("missing symbol")?
        .to_ascii_uppercase();

    let price = non_negative(&raw.price, "price")?;
    let market_cap = non_negative(&raw.market_cap, "market_cap")?;

    // Missing change is treated as a flat day rather than a bad row.
    let change_24h = raw.change_24h.to_f64().unwrap_or(0.0);
    let volume_24h = raw.volume_24h.to_f64().filter(|v| *v >= 0.0);

    let category = raw.category.to_text();
    let coin_type = CoinType::classify(category.as_deref(), &raw.tags);

    Ok(CoinRecord {
        id: raw.id.to_text(),
        name,
        symbol,
        price,
        market_cap,
        change_24h,
        volume_24h,
        coin_type,
    })
}

fn non_negative(value: &RawValue, field: &str) -> Result<f64, String> {
    match value.to_f64() {
        Some(v) if v >= 0.0 => Ok(v),
        Some(v) => Err(format!("{field} is negative: {v}")),
        None => Err(format!("{field} is missing or not numeric: {value}")),
    }
}
