//! Playlist recommendation engine
//!
//! Turns one playlist's `TrackTable` into an ordered list of tracks similar to
//! a seed song. Data flows strictly forward:
//!
//! 1. `normalizer` rescales each audio-feature column into [0, 1]
//! 2. `similarity` ranks rows by cosine similarity to the seed row
//! 3. `popularity` discounts catalog popularity by time since release
//! 4. `ranker` merges the two signals into the final ordering
//!
//! Everything here is synchronous and request scoped. Nothing is cached
//! between calls, and the table is only ever borrowed immutably.

use thiserror::Error;

pub mod normalizer;
pub mod popularity;
pub mod ranker;
pub mod similarity;

pub use normalizer::{normalize, ColumnBounds, FeatureVector, NormalizedFeatureMatrix};
pub use popularity::{recency_weight, weighted_popularity};
pub use ranker::{recommend, HybridRanker, PopularityBlend, DEFAULT_NUM_RECOMMENDATIONS};
pub use similarity::{content_based_recommendations, cosine_similarity, SimilarTrack};

/// Error types for the recommendation engine
///
/// None of these escape `HybridRanker::recommend`; they are logged and folded
/// into an unsuccessful `Recommendations`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecommendError {
    #[error("'{0}' not found in the playlist")]
    NotFound(String),

    #[error("Missing data for '{track}': {reason}")]
    MissingData { track: String, reason: String },

    #[error("Not enough usable tracks: {0}")]
    DegenerateInput(String),
}

impl RecommendError {
    pub(crate) fn missing(track: &str, reason: &str) -> Self {
        RecommendError::MissingData {
            track: track.to_string(),
            reason: reason.to_string(),
        }
    }
}
