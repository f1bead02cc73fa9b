use crate::models::{RecommendationEntry, TrackRecord, TrackTable};

use super::{NormalizedFeatureMatrix, RecommendError};

/// A candidate row and its similarity to the seed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarTrack {
    /// Row index in the `TrackTable`
    pub index: usize,
    pub similarity: f64,
}

/// Cosine similarity of two vectors
///
/// ```text
/// cos(a, b) = a·b / (‖a‖ ‖b‖)
/// ```
///
/// Defined as 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Returns the `k` usable rows most similar to `seed_index`, most similar first.
///
/// The seed row itself is never returned. Equal similarities keep table order.
pub fn similar_tracks(
    seed_index: usize,
    table: &TrackTable,
    matrix: &NormalizedFeatureMatrix,
    k: usize,
) -> Result<Vec<SimilarTrack>, RecommendError> {
    let seed_name = table
        .get(seed_index)
        .map(|track| track.name.as_str())
        .ok_or_else(|| RecommendError::NotFound(format!("row {}", seed_index)))?;

    let seed_vector = matrix
        .row(seed_index)
        .ok_or_else(|| RecommendError::missing(seed_name, "incomplete audio features"))?;

    let mut scored: Vec<SimilarTrack> = (0..matrix.len())
        .filter(|&index| index != seed_index)
        .filter_map(|index| {
            matrix.row(index).map(|vector| SimilarTrack {
                index,
                similarity: cosine_similarity(seed_vector, vector),
            })
        })
        .collect();

    // Stable, so ties stay in playlist order
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(k);

    Ok(scored)
}

/// The seed row resolved by name and its top-k content matches
pub(crate) struct ContentMatches<'a> {
    pub seed: &'a TrackRecord,
    pub matches: Vec<&'a TrackRecord>,
}

/// Resolves `seed_name` (first match) and collects its `k` most similar rows
pub(crate) fn content_matches<'a>(
    seed_name: &str,
    table: &'a TrackTable,
    matrix: &NormalizedFeatureMatrix,
    k: usize,
) -> Result<ContentMatches<'a>, RecommendError> {
    let not_found = || RecommendError::NotFound(seed_name.to_string());
    let seed_index = table.find_by_name(seed_name).ok_or_else(not_found)?;
    let seed = table.get(seed_index).ok_or_else(not_found)?;

    let matches = similar_tracks(seed_index, table, matrix, k)?
        .into_iter()
        .filter_map(|similar| table.get(similar.index))
        .collect();

    Ok(ContentMatches { seed, matches })
}

/// Content-only recommendations for `seed_name`, carrying raw catalog popularity
pub fn content_based_recommendations(
    seed_name: &str,
    table: &TrackTable,
    matrix: &NormalizedFeatureMatrix,
    k: usize,
) -> Result<Vec<RecommendationEntry>, RecommendError> {
    let entries = content_matches(seed_name, table, matrix, k)?
        .matches
        .into_iter()
        .map(RecommendationEntry::from_track)
        .collect();

    Ok(entries)
}
