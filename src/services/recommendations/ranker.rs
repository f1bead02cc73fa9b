use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{RecommendationEntry, Recommendations, TrackTable};

use super::{normalize, similarity, weighted_popularity, NormalizedFeatureMatrix, RecommendError};

pub const DEFAULT_NUM_RECOMMENDATIONS: usize = 5;

/// How popularity values are compared when the seed is merged into the
/// content-based list.
///
/// The seed always carries its recency-weighted score. Under `Literal` the
/// candidates keep their raw 0-100 popularity as the sort key, which puts the
/// seed (usually well below 1) at the bottom. `RecencyWeighted` keys every
/// entry by its own weighted score so all keys share one scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopularityBlend {
    #[default]
    Literal,
    RecencyWeighted,
}

/// Blends content similarity with recency-weighted popularity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridRanker {
    num_recommendations: usize,
    blend: PopularityBlend,
}

impl Default for HybridRanker {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_RECOMMENDATIONS)
    }
}

/// A merged-list entry and the key it is sorted by
struct Ranked {
    entry: RecommendationEntry,
    sort_key: Option<f64>,
    is_seed: bool,
}

impl HybridRanker {
    pub fn new(num_recommendations: usize) -> Self {
        Self {
            num_recommendations,
            blend: PopularityBlend::default(),
        }
    }

    pub fn with_blend(mut self, blend: PopularityBlend) -> Self {
        self.blend = blend;
        self
    }

    pub fn blend(&self) -> PopularityBlend {
        self.blend
    }

    /// Recommends tracks similar to `seed_name`, reading the clock once
    pub fn recommend(&self, seed_name: &str, table: &TrackTable) -> Recommendations {
        self.recommend_at(seed_name, table, Utc::now())
    }

    /// Recommends tracks similar to `seed_name` as of `now`.
    ///
    /// Never fails: every error is logged and reported as an unsuccessful,
    /// empty result.
    pub fn recommend_at(
        &self,
        seed_name: &str,
        table: &TrackTable,
        now: DateTime<Utc>,
    ) -> Recommendations {
        let matrix = normalize(table);

        match self.rank(seed_name, table, &matrix, now.date_naive()) {
            Ok(entries) => {
                tracing::info!(
                    seed = %seed_name,
                    tracks = table.len(),
                    usable = matrix.usable_rows(),
                    recommended = entries.len(),
                    "Recommendations generated"
                );
                Recommendations::succeeded(entries)
            }
            Err(e) => {
                tracing::warn!(
                    seed = %seed_name,
                    tracks = table.len(),
                    error = %e,
                    "Failed to generate recommendations"
                );
                Recommendations::failed()
            }
        }
    }

    /// Produces the hybrid ordering for `seed_name`.
    ///
    /// The top-k content matches are merged with an entry for the seed
    /// carrying its weighted popularity, the merged list is sorted by
    /// popularity descending, and the seed entry is dropped again.
    pub fn rank(
        &self,
        seed_name: &str,
        table: &TrackTable,
        matrix: &NormalizedFeatureMatrix,
        today: NaiveDate,
    ) -> Result<Vec<RecommendationEntry>, RecommendError> {
        let similarity::ContentMatches { seed, matches } =
            similarity::content_matches(seed_name, table, matrix, self.num_recommendations)?;
        if matches.is_empty() {
            return Err(RecommendError::DegenerateInput(format!(
                "no other track in the playlist can be compared with '{}'",
                seed_name
            )));
        }

        let seed_score = weighted_popularity(seed, today)?;

        let mut merged: Vec<Ranked> = matches
            .into_iter()
            .map(|track| {
                let entry = RecommendationEntry::from_track(track);
                let sort_key = match self.blend {
                    PopularityBlend::Literal => entry.popularity,
                    PopularityBlend::RecencyWeighted => weighted_popularity(track, today).ok(),
                };
                Ranked {
                    entry,
                    sort_key,
                    is_seed: false,
                }
            })
            .collect();

        merged.push(Ranked {
            entry: RecommendationEntry::with_popularity(seed, Some(seed_score)),
            sort_key: Some(seed_score),
            is_seed: true,
        });

        merged.sort_by(|a, b| descending_missing_last(a.sort_key, b.sort_key));

        Ok(merged
            .into_iter()
            .filter(|ranked| !ranked.is_seed)
            .map(|ranked| ranked.entry)
            .collect())
    }
}

fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Recommends up to `k` tracks similar to `seed_name` with the default blend
pub fn recommend(seed_name: &str, table: &TrackTable, k: usize) -> Recommendations {
    HybridRanker::new(k).recommend(seed_name, table)
}
