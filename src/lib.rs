//! Crypto market snapshot pipeline.
//!
//! ```text
//!  raw records ─▶ data::build ─▶ Dataset ─┬─▶ data::filter
//!                                          └─▶ analysis::top_gainers ─▶ selection
//!                                                                          │
//!                                 analysis::find_similar ◀─────────────────┘
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use state::{Recommendation, RefreshSnapshot};
