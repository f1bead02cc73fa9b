use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod track;

pub use track::{
    AudioFeatures, RecommendationEntry, Recommendations, TrackRecord, TrackTable, FEATURE_COUNT,
    FEATURE_NAMES,
};

/// Request body for the recommendations endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub playlist_id: String,
    pub song_name: String,
    #[serde(default)]
    pub num_recommendations: Option<usize>,
}

/// Response with the playlist contents and the tracks recommended from it
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub playlist_tracks: Vec<String>,
    pub recommendations: Vec<RecommendationEntry>,
}

/// OAuth tokens held for a logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Builds a token set from a token endpoint response received at `now`.
    ///
    /// Refresh responses may omit the refresh token, in which case
    /// `previous_refresh_token` is kept.
    pub fn from_response(
        response: ApiTokenResponse,
        now: DateTime<Utc>,
        previous_refresh_token: Option<String>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh_token),
            expires_at: now + Duration::seconds(response.expires_in),
        }
    }
}

// ============================================================================
// Spotify Web API Types
// ============================================================================

/// One page of `GET /playlists/{id}/tracks`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlaylistPage {
    #[serde(default)]
    pub items: Vec<ApiPlaylistItem>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlaylistItem {
    /// Null for removed or unavailable tracks
    #[serde(default)]
    pub track: Option<ApiPlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlaylistTrack {
    /// Null for local files
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    pub album: ApiAlbumRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAlbumRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Response of `GET /tracks?ids=`
#[derive(Debug, Deserialize)]
pub struct ApiTracksResponse {
    pub tracks: Vec<Option<ApiTrackDetails>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrackDetails {
    pub id: String,
    #[serde(default)]
    pub popularity: Option<u8>,
    #[serde(default)]
    pub explicit: Option<bool>,
    #[serde(default)]
    pub duration_ms: Option<u32>,
    #[serde(default)]
    pub external_urls: ApiExternalUrls,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// Response of `GET /albums?ids=`
#[derive(Debug, Deserialize)]
pub struct ApiAlbumsResponse {
    pub albums: Vec<Option<ApiAlbumDetails>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAlbumDetails {
    pub id: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub release_date_precision: Option<String>,
}

impl ApiAlbumDetails {
    /// Parses the release date, padding year and month precision dates to
    /// the first day of the period
    pub fn parsed_release_date(&self) -> Option<NaiveDate> {
        let raw = self.release_date.as_deref()?;
        let padded = match self.release_date_precision.as_deref() {
            Some("year") => format!("{}-01-01", raw),
            Some("month") => format!("{}-01", raw),
            _ => raw.to_string(),
        };
        NaiveDate::parse_from_str(&padded, "%Y-%m-%d").ok()
    }
}

/// Response of `GET /audio-features?ids=`
#[derive(Debug, Deserialize)]
pub struct ApiAudioFeaturesResponse {
    pub audio_features: Vec<Option<ApiAudioFeatures>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAudioFeatures {
    pub id: String,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub key: Option<f64>,
    pub loudness: Option<f64>,
    pub mode: Option<f64>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u32>,
}

impl From<ApiAudioFeatures> for AudioFeatures {
    fn from(api: ApiAudioFeatures) -> Self {
        Self {
            danceability: api.danceability,
            energy: api.energy,
            key: api.key,
            loudness: api.loudness,
            mode: api.mode,
            speechiness: api.speechiness,
            acousticness: api.acousticness,
            instrumentalness: api.instrumentalness,
            liveness: api.liveness,
            valence: api.valence,
            tempo: api.tempo,
        }
    }
}

/// Token endpoint response for both the authorization-code and refresh grants
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(date: Option<&str>, precision: Option<&str>) -> ApiAlbumDetails {
        ApiAlbumDetails {
            id: "album".to_string(),
            release_date: date.map(str::to_string),
            release_date_precision: precision.map(str::to_string),
        }
    }

    #[test]
    fn test_release_date_day_precision() {
        let parsed = album(Some("2021-03-19"), Some("day")).parsed_release_date();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2021, 3, 19));
    }

    #[test]
    fn test_release_date_year_precision() {
        let parsed = album(Some("1977"), Some("year")).parsed_release_date();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(1977, 1, 1));
    }

    #[test]
    fn test_release_date_month_precision() {
        let parsed = album(Some("1999-06"), Some("month")).parsed_release_date();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(1999, 6, 1));
    }

    #[test]
    fn test_release_date_missing_or_malformed() {
        assert_eq!(album(None, Some("day")).parsed_release_date(), None);
        assert_eq!(album(Some("soon"), None).parsed_release_date(), None);
    }

    #[test]
    fn test_playlist_page_deserialization_with_null_track() {
        let json = r#"{
            "items": [
                {"track": {"id": "t1", "name": "Song", "artists": [{"name": "A"}, {"name": "B"}],
                           "album": {"id": "a1", "name": "Record"}}},
                {"track": null}
            ],
            "next": null
        }"#;

        let page: ApiPlaylistPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items[1].track.is_none());
        let track = page.items[0].track.as_ref().unwrap();
        assert_eq!(track.id.as_deref(), Some("t1"));
        assert_eq!(track.artists.len(), 2);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_audio_features_deserialization() {
        let json = r#"{
            "id": "t1", "danceability": 0.7, "energy": 0.8, "key": 5, "loudness": -6.1,
            "mode": 1, "speechiness": 0.04, "acousticness": 0.1, "instrumentalness": 0.0,
            "liveness": 0.2, "valence": 0.6, "tempo": 120.0, "duration_ms": 210000
        }"#;

        let api: ApiAudioFeatures = serde_json::from_str(json).unwrap();
        let features = AudioFeatures::from(api);
        assert_eq!(features.key, Some(5.0));
        assert_eq!(features.mode, Some(1.0));
        assert!(features.to_vector().is_some());
    }

    #[test]
    fn test_token_set_keeps_previous_refresh_token() {
        let now = Utc::now();
        let response = ApiTokenResponse {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: 3600,
        };

        let tokens = TokenSet::from_response(response, now, Some("old-refresh".to_string()));

        assert_eq!(tokens.access_token, "new-access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(tokens.expires_at, now + Duration::seconds(3600));
        assert!(!tokens.is_expired(now));
        assert!(tokens.is_expired(now + Duration::seconds(3600)));
    }

    #[test]
    fn test_token_response_deserialization() {
        let json = r#"{"access_token": "abc", "token_type": "Bearer", "expires_in": 3600,
                       "refresh_token": "def", "scope": "user-read-private"}"#;
        let response: ApiTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.refresh_token.as_deref(), Some("def"));
        assert_eq!(response.expires_in, 3600);
    }

    #[test]
    fn test_recommendation_request_defaults() {
        let request: RecommendationRequest =
            serde_json::from_str(r#"{"playlist_id": "p1", "song_name": "Song"}"#).unwrap();
        assert_eq!(request.num_recommendations, None);
    }
}
