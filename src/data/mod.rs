/// Data layer: core types, loading, validation and filtering.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawCoinRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ builder   │  validate, classify, dedupe → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  type set / price range / cap floor → Dataset
///   └──────────┘
/// ```

pub mod builder;
pub mod filter;
pub mod loader;
pub mod model;

pub use builder::{build, build_with_report, BuildReport};
pub use filter::{filter, FilterCriteria};
pub use model::{CoinRecord, CoinType, Dataset, RawCoinRecord, RawValue};
