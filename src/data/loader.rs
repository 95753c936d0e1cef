use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray, StringArray, UInt64Array,
};
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::model::{RawCoinRecord, RawValue};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw market snapshot from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `[{ "symbol": ..., "price": ..., ... }, ...]`, or a
///   CoinMarketCap-style listing `{ "data": [{ ..., "quote": { "USD": {...} } }] }`
/// * `.csv`     – header row; `tags` holds semicolon-separated values
/// * `.parquet` – flat columns, names as for CSV
///
/// Only structural problems are errors. Odd field values are passed through
/// for the builder to reject.
pub fn load_file(path: &Path) -> Result<Vec<RawCoinRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!("Loaded {} raw records from {}", records.len(), path.display());
    Ok(records)
}

// ---------------------------------------------------------------------------
// Column naming
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Name,
    Symbol,
    Price,
    MarketCap,
    Change24h,
    Volume24h,
    Category,
    Tags,
}

/// Map a provider column name onto a record field (case-insensitive).
fn field_for(column: &str) -> Option<Field> {
    let field = match column.trim().to_ascii_lowercase().as_str() {
        "id" => Field::Id,
        "name" => Field::Name,
        "symbol" | "ticker" => Field::Symbol,
        "price" | "current_price" | "price_usd" => Field::Price,
        "market_cap" | "marketcap" | "market_cap_usd" => Field::MarketCap,
        "change_24h" | "24h_change" | "percent_change_24h" | "price_change_percentage_24h" => {
            Field::Change24h
        }
        "volume_24h" | "total_volume" | "volume" => Field::Volume24h,
        "category" | "type" | "tag" | "coin_type" => Field::Category,
        "tags" | "categories" => Field::Tags,
        _ => return None,
    };
    Some(field)
}

fn assign(record: &mut RawCoinRecord, field: Field, value: RawValue) {
    let slot = match field {
        Field::Id => &mut record.id,
        Field::Name => &mut record.name,
        Field::Symbol => &mut record.symbol,
        Field::Price => &mut record.price,
        Field::MarketCap => &mut record.market_cap,
        Field::Change24h => &mut record.change_24h,
        Field::Volume24h => &mut record.volume_24h,
        Field::Category => &mut record.category,
        Field::Tags => {
            if let RawValue::String(s) = &value {
                record.tags = split_tags(s);
            }
            return;
        }
    };
    *slot = value;
}

fn split_tags(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<RawCoinRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    parse_json(&root)
}

/// Parse an already-decoded JSON document into raw records.
pub fn parse_json(root: &JsonValue) -> Result<Vec<RawCoinRecord>> {
    let rows = match root {
        JsonValue::Array(rows) => rows,
        JsonValue::Object(obj) => obj
            .get("data")
            .and_then(JsonValue::as_array)
            .context("Expected a top-level array or an object with a \"data\" array")?,
        _ => bail!("Expected top-level JSON array"),
    };

    Ok(rows
        .iter()
        .enumerate()
        .map(|(i, row)| match row.as_object() {
            Some(obj) => json_record(obj),
            None => {
                debug!("Row {i} is not a JSON object, kept as an empty record");
                RawCoinRecord::default()
            }
        })
        .collect())
}

fn json_record(obj: &Map<String, JsonValue>) -> RawCoinRecord {
    let mut record = RawCoinRecord::default();

    for (key, val) in obj {
        match field_for(key) {
            Some(Field::Tags) => record.tags = json_tags(val),
            Some(field) => assign(&mut record, field, json_to_raw(val)),
            None => {}
        }
    }

    // Provider listings nest market figures under quote.<currency>.
    if let Some(quote) = obj.get("quote").and_then(pick_quote) {
        for (key, val) in quote {
            let Some(field) = field_for(key) else { continue };
            if quote_slot(&record, field).is_some_and(RawValue::is_null) {
                assign(&mut record, field, json_to_raw(val));
            }
        }
    }

    record
}

fn pick_quote(quote: &JsonValue) -> Option<&Map<String, JsonValue>> {
    let quotes = quote.as_object()?;
    quotes
        .get("USD")
        .or_else(|| quotes.values().next())
        .and_then(JsonValue::as_object)
}

/// The market-figure slot a quote entry may fill; `None` for other fields.
fn quote_slot(record: &RawCoinRecord, field: Field) -> Option<&RawValue> {
    match field {
        Field::Price => Some(&record.price),
        Field::MarketCap => Some(&record.market_cap),
        Field::Change24h => Some(&record.change_24h),
        Field::Volume24h => Some(&record.volume_24h),
        _ => None,
    }
}

fn json_tags(val: &JsonValue) -> Vec<String> {
    match val {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|t| match t {
                JsonValue::String(s) => Some(s.trim().to_string()),
                // {"slug": "...", "name": "..."} style tag objects
                JsonValue::Object(o) => o
                    .get("slug")
                    .or_else(|| o.get("name"))
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .filter(|t| !t.is_empty())
            .collect(),
        JsonValue::String(s) => split_tags(s),
        _ => Vec::new(),
    }
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) => RawValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                RawValue::Float(f)
            } else {
                RawValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => RawValue::Bool(*b),
        JsonValue::Null => RawValue::Null,
        other => RawValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<RawCoinRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<Option<Field>> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(field_for)
        .collect();

    if !columns.contains(&Some(Field::Symbol)) {
        bail!("CSV missing 'symbol' column");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut record = RawCoinRecord::default();
        for (field, value) in columns.iter().zip(row.iter()) {
            if let Some(field) = field {
                assign(&mut record, *field, guess_raw_type(value));
            }
        }
        records.push(record);
    }

    Ok(records)
}

fn guess_raw_type(s: &str) -> RawValue {
    let s = s.trim();
    if s.is_empty() {
        return RawValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return RawValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return RawValue::Float(f);
    }
    if s == "true" || s == "false" {
        return RawValue::Bool(s == "true");
    }
    RawValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat coin rows.
///
/// Numeric columns may be any of Int32/Int64/UInt64/Float32/Float64 or text;
/// `tags` may be a string column or a List<Utf8>.
fn load_parquet(path: &Path) -> Result<Vec<RawCoinRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns: Vec<(Field, &Arc<dyn Array>)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter_map(|(i, f)| field_for(f.name()).map(|field| (field, batch.column(i))))
            .collect();

        if !columns.iter().any(|(field, _)| *field == Field::Symbol) {
            bail!("Parquet file missing 'symbol' column");
        }

        for row in 0..batch.num_rows() {
            let mut record = RawCoinRecord::default();
            for (field, col) in &columns {
                if *field == Field::Tags {
                    record.tags = extract_tags(col, row);
                } else {
                    assign(&mut record, *field, extract_raw_value(col, row));
                }
            }
            records.push(record);
        }
    }

    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &Arc<dyn Array>, row: usize) -> RawValue {
    if col.is_null(row) {
        return RawValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map_or(RawValue::Null, |a| RawValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map_or(RawValue::Null, |a| RawValue::String(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(RawValue::Null, |a| RawValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(RawValue::Null, |a| RawValue::Integer(a.value(row))),
        DataType::UInt64 => any
            .downcast_ref::<UInt64Array>()
            .map_or(RawValue::Null, |a| RawValue::Float(a.value(row) as f64)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(RawValue::Null, |a| RawValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(RawValue::Null, |a| RawValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(RawValue::Null, |a| RawValue::Bool(a.value(row))),
        other => {
            debug!("Unsupported column type {other:?}, value ignored");
            RawValue::Null
        }
    }
}

/// Tags from either a semicolon-separated string or a list-of-strings column.
fn extract_tags(col: &Arc<dyn Array>, row: usize) -> Vec<String> {
    if col.is_null(row) {
        return Vec::new();
    }
    let values = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .map(|list| list.value(row)),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .map(|list| list.value(row)),
        _ => {
            return match extract_raw_value(col, row) {
                RawValue::String(s) => split_tags(&s),
                _ => Vec::new(),
            };
        }
    };

    values
        .as_ref()
        .and_then(|v| v.as_any().downcast_ref::<StringArray>())
        .map(|strings| {
            strings
                .iter()
                .flatten()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_json_array() {
        let doc = json!([
            { "Symbol": "btc", "name": "Bitcoin", "price": 50000.5, "market_cap": "1e12",
              "24h_change": 2, "type": "Coin", "tags": ["mineable"] },
            "not an object"
        ]);
        let records = parse_json(&doc).unwrap();
        assert_eq!(records.len(), 2);
        let btc = &records[0];
        assert_eq!(btc.symbol, RawValue::from("btc"));
        assert_eq!(btc.price, RawValue::Float(50000.5));
        assert_eq!(btc.market_cap, RawValue::from("1e12"));
        assert_eq!(btc.change_24h, RawValue::Integer(2));
        assert_eq!(btc.category, RawValue::from("Coin"));
        assert_eq!(btc.tags, vec!["mineable".to_string()]);
        assert_eq!(records[1], RawCoinRecord::default());
    }

    #[test]
    fn listing_with_nested_quote() {
        let doc = json!({
            "status": {},
            "data": [{
                "id": 1, "slug": "bitcoin", "name": "Bitcoin", "symbol": "BTC",
                "tags": [{ "slug": "pow" }, "store-of-value"],
                "quote": { "USD": {
                    "price": 50000.0, "market_cap": 1.0e12,
                    "percent_change_24h": -1.25, "volume_24h": 3.0e10
                } }
            }]
        });
        let records = parse_json(&doc).unwrap();
        let btc = &records[0];
        assert_eq!(btc.id, RawValue::Integer(1));
        assert_eq!(btc.price, RawValue::Float(50000.0));
        assert_eq!(btc.change_24h, RawValue::Float(-1.25));
        assert_eq!(btc.volume_24h, RawValue::Float(3.0e10));
        assert_eq!(btc.tags, vec!["pow".to_string(), "store-of-value".to_string()]);
    }

    #[test]
    fn quote_only_fills_market_figures() {
        let doc = json!([{
            "symbol": "ETH", "price": 3000.0,
            "quote": { "USD": { "price": 1.0, "name": "Other", "symbol": "XXX" } }
        }]);
        let eth = &parse_json(&doc).unwrap()[0];
        assert_eq!(eth.price, RawValue::Float(3000.0));
        assert_eq!(eth.symbol, RawValue::from("ETH"));
        assert_eq!(eth.name, RawValue::Null);

        let rec = RawCoinRecord::default();
        assert!(quote_slot(&rec, Field::Tags).is_none());
        assert!(quote_slot(&rec, Field::Category).is_none());
        assert!(quote_slot(&rec, Field::Price).is_some());
    }

    #[test]
    fn rejects_non_array_root() {
        assert!(parse_json(&json!("hello")).is_err());
        assert!(parse_json(&json!({ "items": [] })).is_err());
    }

    #[test]
    fn csv_cell_guessing() {
        assert_eq!(guess_raw_type(""), RawValue::Null);
        assert_eq!(guess_raw_type("12"), RawValue::Integer(12));
        assert_eq!(guess_raw_type(" 0.5 "), RawValue::Float(0.5));
        assert_eq!(guess_raw_type("true"), RawValue::Bool(true));
        assert_eq!(guess_raw_type("n/a"), RawValue::from("n/a"));
    }

    #[test]
    fn column_aliases() {
        assert_eq!(field_for("Current_Price"), Some(Field::Price));
        assert_eq!(field_for("percent_change_24h"), Some(Field::Change24h));
        assert_eq!(field_for("type"), Some(Field::Category));
        assert_eq!(field_for("rank"), None);
        assert_eq!(field_for("slug"), None);
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("coins.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
