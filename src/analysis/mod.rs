//! Ranking and recommendation over a built [`Dataset`](crate::data::Dataset).

pub mod gainers;
pub mod similarity;

pub use gainers::{gainer_order, top_gainers, top_gainers_with};
pub use similarity::{
    find_similar, find_similar_with, FeatureBounds, SimilarMatch, SimilarityResult,
};
