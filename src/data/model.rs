use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawValue – a single provider-supplied cell
// ---------------------------------------------------------------------------

/// A dynamically-typed field value as received from a market-data provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    #[default]
    Null,
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::String(s) => write!(f, "{s:?}"),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Null => write!(f, "<null>"),
        }
    }
}

impl RawValue {
    /// Coerce to a finite `f64`.
    ///
    /// Strings are trimmed and parsed; booleans, nulls and non-finite
    /// numbers yield `None`. Negative zero comes back as `0.0`.
    pub fn to_f64(&self) -> Option<f64> {
        let v = match self {
            RawValue::Float(v) => *v,
            RawValue::Integer(i) => *i as f64,
            RawValue::String(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Bool(_) | RawValue::Null => return None,
        };
        // -0.0 + 0.0 == +0.0, so "-0.00" ties with "0.00" under total_cmp.
        v.is_finite().then_some(v + 0.0)
    }

    /// Trimmed, non-empty text form. Numbers are rendered, nulls are `None`.
    pub fn to_text(&self) -> Option<String> {
        let s = match self {
            RawValue::String(s) => s.trim().to_string(),
            RawValue::Integer(i) => i.to_string(),
            RawValue::Float(v) => v.to_string(),
            RawValue::Bool(_) | RawValue::Null => return None,
        };
        (!s.is_empty()).then_some(s)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Integer(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

// ---------------------------------------------------------------------------
// RawCoinRecord – one unvalidated provider row
// ---------------------------------------------------------------------------

/// Unvalidated coin data. No invariants hold; any field may be missing or
/// of the wrong type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCoinRecord {
    pub id: RawValue,
    pub name: RawValue,
    pub symbol: RawValue,
    pub price: RawValue,
    pub market_cap: RawValue,
    /// 24h percent change.
    pub change_24h: RawValue,
    pub volume_24h: RawValue,
    /// Provider category / tag (primary).
    pub category: RawValue,
    /// Secondary tags, consulted when the category is not recognised.
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// CoinType – the closed label set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CoinType {
    Coin,
    Token,
    Stablecoin,
    DeFi,
    Meme,
    Nft,
    Layer2,
    Other,
}

impl CoinType {
    /// Every label, in display order.
    pub const ALL: [CoinType; 8] = [
        CoinType::Coin,
        CoinType::Token,
        CoinType::Stablecoin,
        CoinType::DeFi,
        CoinType::Meme,
        CoinType::Nft,
        CoinType::Layer2,
        CoinType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CoinType::Coin => "Coin",
            CoinType::Token => "Token",
            CoinType::Stablecoin => "Stablecoin",
            CoinType::DeFi => "DeFi",
            CoinType::Meme => "Meme",
            CoinType::Nft => "NFT",
            CoinType::Layer2 => "Layer 2",
            CoinType::Other => "Other",
        }
    }

    /// Map a provider tag onto a known label. `None` when unrecognised.
    pub fn from_provider_tag(tag: &str) -> Option<CoinType> {
        let tag = tag.trim().to_ascii_lowercase();
        let ty = match tag.as_str() {
            "coin" | "coins" | "mineable" | "pow" | "layer-1" | "layer 1" | "layer1" => {
                CoinType::Coin
            }
            "token" | "tokens" | "erc20" | "erc-20" | "bep20" | "bep-20" => CoinType::Token,
            "stablecoin" | "stablecoins" | "stable" | "asset-backed-stablecoin" => {
                CoinType::Stablecoin
            }
            "defi" | "decentralized-finance-defi" | "decentralized-exchange" | "dex"
            | "yield-farming" | "lending-borrowing" => CoinType::DeFi,
            "meme" | "memes" | "meme-token" | "memecoin" => CoinType::Meme,
            "nft" | "nfts" | "collectibles-nfts" | "non-fungible-tokens-nft" => CoinType::Nft,
            "layer 2" | "layer-2" | "layer2" | "l2" | "scaling" | "rollups" => CoinType::Layer2,
            _ => return None,
        };
        Some(ty)
    }

    /// Resolve the label for a raw record: category first, then each tag in
    /// order; `Other` when nothing is recognised.
    pub fn classify(category: Option<&str>, tags: &[String]) -> CoinType {
        category
            .into_iter()
            .chain(tags.iter().map(String::as_str))
            .find_map(CoinType::from_provider_tag)
            .unwrap_or(CoinType::Other)
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CoinType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = CoinType::ALL.iter().map(|t| t.label()).collect();
                format!("Unknown coin type '{wanted}'. Expected one of: {}", known.join(", "))
            })
    }
}

impl TryFrom<String> for CoinType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CoinType> for String {
    fn from(t: CoinType) -> Self {
        t.label().to_string()
    }
}

// ---------------------------------------------------------------------------
// CoinRecord – one validated row
// ---------------------------------------------------------------------------

/// A validated coin. Only the Dataset Builder creates these from raw data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub change_24h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(rename = "type")]
    pub coin_type: CoinType,
}

impl CoinRecord {
    /// Feature vector used for similarity scoring.
    pub fn features(&self) -> [f64; 3] {
        [self.price, self.market_cap, self.change_24h]
    }
}

// ---------------------------------------------------------------------------
// Dataset – an immutable snapshot, unique by symbol
// ---------------------------------------------------------------------------

/// Ordered collection of coins, unique by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<CoinRecord>,
}

impl Dataset {
    /// Build from records, keeping the first record seen for each symbol.
    pub fn from_records(records: impl IntoIterator<Item = CoinRecord>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let records = records
            .into_iter()
            .filter(|r| seen.insert(r.symbol.to_ascii_uppercase()))
            .collect();
        Dataset { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CoinRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[CoinRecord] {
        &self.records
    }

    /// Case-insensitive symbol lookup.
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&CoinRecord> {
        let symbol = symbol.trim();
        self.records
            .iter()
            .find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }

    /// First record whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&CoinRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Sorted set of coin types present in this snapshot.
    pub fn types_present(&self) -> BTreeSet<CoinType> {
        self.records.iter().map(|r| r.coin_type).collect()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a CoinRecord;
    type IntoIter = std::slice::Iter<'a, CoinRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<CoinRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = CoinRecord>>(iter: I) -> Self {
        Dataset::from_records(iter)
    }
}

#[cfg(test)]
pub(crate) fn coin(symbol: &str, price: f64, market_cap: f64, change: f64, ty: CoinType) -> CoinRecord {
    CoinRecord {
        id: None,
        name: symbol.to_string(),
        symbol: symbol.to_string(),
        price,
        market_cap,
        change_24h: change,
        volume_24h: None,
        coin_type: ty,
    }
}
