use chrono::NaiveDate;

use crate::models::TrackRecord;

use super::RecommendError;

/// Weight that favors recent releases: `1 / (days_since_release + 1)`.
///
/// Releases dated after `today` count as released today, so the weight
/// never exceeds 1.
pub fn recency_weight(release_date: NaiveDate, today: NaiveDate) -> f64 {
    let days_since_release = (today - release_date).num_days().max(0);
    1.0 / (days_since_release as f64 + 1.0)
}

/// Catalog popularity discounted by time since release
pub fn weighted_popularity(track: &TrackRecord, today: NaiveDate) -> Result<f64, RecommendError> {
    let popularity = track
        .popularity
        .ok_or_else(|| RecommendError::missing(&track.name, "no catalog popularity"))?;
    let release_date = track
        .release_date
        .ok_or_else(|| RecommendError::missing(&track.name, "no release date"))?;

    Ok(f64::from(popularity) * recency_weight(release_date, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFeatures;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn track(popularity: Option<u8>, release_date: Option<NaiveDate>) -> TrackRecord {
        TrackRecord {
            track_id: "t1".to_string(),
            album_id: "a1".to_string(),
            name: "Song".to_string(),
            artists: "Artist".to_string(),
            album_name: "Album".to_string(),
            release_date,
            popularity,
            explicit: None,
            external_url: None,
            duration_ms: None,
            features: AudioFeatures::default(),
        }
    }

    #[test]
    fn test_released_today_has_full_weight() {
        assert_eq!(recency_weight(today(), today()), 1.0);
    }

    #[test]
    fn test_weight_decays_with_age() {
        let ten_days_ago = today() - Duration::days(10);
        assert!((recency_weight(ten_days_ago, today()) - 1.0 / 11.0).abs() < 1e-12);

        let older = today() - Duration::days(3000);
        assert!(recency_weight(older, today()) < recency_weight(ten_days_ago, today()));
    }

    #[test]
    fn test_future_release_is_clamped() {
        let next_month = today() + Duration::days(30);
        assert_eq!(recency_weight(next_month, today()), 1.0);
    }

    #[test]
    fn test_weighted_popularity() {
        let released = today() - Duration::days(4);
        let score = weighted_popularity(&track(Some(80), Some(released)), today()).unwrap();
        assert!((score - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_popularity_is_defined() {
        let score = weighted_popularity(&track(Some(0), Some(today())), today()).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_missing_release_date() {
        let result = weighted_popularity(&track(Some(80), None), today());
        assert_eq!(
            result,
            Err(RecommendError::MissingData {
                track: "Song".to_string(),
                reason: "no release date".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_popularity() {
        let result = weighted_popularity(&track(None, Some(today())), today());
        assert!(matches!(result, Err(RecommendError::MissingData { .. })));
    }
}
