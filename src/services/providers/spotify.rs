/// Spotify Web API catalog provider
///
/// API Flow:
/// 1. Playlist items: /playlists/{id}/tracks, following `next` until exhausted
/// 2. Popularity, explicit flag, links: /tracks?ids= (50 per call)
/// 3. Release dates: /albums?ids= (20 per call)
/// 4. Audio features: /audio-features?ids= (100 per call)
///
/// Steps 2-4 run concurrently. A failed batch leaves the affected fields
/// empty instead of failing the playlist.
use crate::{
    error::{AppError, AppResult},
    models::{
        ApiAlbumsResponse, ApiAudioFeatures, ApiAudioFeaturesResponse, ApiPlaylistPage,
        ApiPlaylistTrack, ApiTrackDetails, ApiTracksResponse, AudioFeatures, TrackRecord,
        TrackTable,
    },
    services::providers::CatalogProvider,
};
use chrono::NaiveDate;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Instant;

const PLAYLIST_FIELDS: &str = "next,items(track(id,name,artists(name),album(id,name)))";
const PLAYLIST_PAGE_LIMIT: &str = "100";
const MAX_PLAYLIST_PAGES: usize = 100;
const TRACKS_BATCH: usize = 50;
const ALBUMS_BATCH: usize = 20;
const AUDIO_FEATURES_BATCH: usize = 100;

#[derive(Clone)]
pub struct SpotifyCatalog {
    http_client: HttpClient,
    api_url: String,
}

impl SpotifyCatalog {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// GETs `url` with the user's token and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        access_token: &str,
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized(
                "Spotify rejected the access token".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Spotify API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                "Failed to deserialize Spotify response"
            );
            AppError::ExternalApi(format!("Failed to parse Spotify response: {}", e))
        })
    }

    /// Collects every track of the playlist, following pagination
    async fn fetch_playlist_tracks(
        &self,
        playlist_id: &str,
        access_token: &str,
    ) -> AppResult<Vec<ApiPlaylistTrack>> {
        let first_url = format!("{}/playlists/{}/tracks", self.api_url, playlist_id);
        let mut page: ApiPlaylistPage = self
            .get_json(
                &first_url,
                &[("fields", PLAYLIST_FIELDS), ("limit", PLAYLIST_PAGE_LIMIT)],
                access_token,
            )
            .await?;

        let mut tracks = Vec::new();
        let mut pages = 1;
        loop {
            tracks.extend(page.items.into_iter().filter_map(|item| item.track));

            let next = match page.next {
                Some(next) if pages < MAX_PLAYLIST_PAGES => next,
                Some(_) => {
                    tracing::warn!(
                        playlist_id = %playlist_id,
                        pages,
                        "Playlist page limit reached, truncating"
                    );
                    break;
                }
                None => break,
            };

            // `next` already carries the query string
            page = self.get_json(&next, &[], access_token).await?;
            pages += 1;
        }

        Ok(tracks)
    }

    async fn fetch_track_details(
        &self,
        track_ids: &[String],
        access_token: &str,
    ) -> HashMap<String, ApiTrackDetails> {
        let url = format!("{}/tracks", self.api_url);
        let mut details = HashMap::new();

        for batch in track_ids.chunks(TRACKS_BATCH) {
            let ids = batch.join(",");
            match self
                .get_json::<ApiTracksResponse>(&url, &[("ids", ids.as_str())], access_token)
                .await
            {
                Ok(response) => details.extend(
                    response
                        .tracks
                        .into_iter()
                        .flatten()
                        .map(|track| (track.id.clone(), track)),
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    batch_size = batch.len(),
                    "Track details lookup failed"
                ),
            }
        }

        details
    }

    async fn fetch_release_dates(
        &self,
        album_ids: &[String],
        access_token: &str,
    ) -> HashMap<String, NaiveDate> {
        let url = format!("{}/albums", self.api_url);
        let mut release_dates = HashMap::new();

        for batch in album_ids.chunks(ALBUMS_BATCH) {
            let ids = batch.join(",");
            match self
                .get_json::<ApiAlbumsResponse>(&url, &[("ids", ids.as_str())], access_token)
                .await
            {
                Ok(response) => release_dates.extend(
                    response
                        .albums
                        .into_iter()
                        .flatten()
                        .filter_map(|album| Some((album.id.clone(), album.parsed_release_date()?))),
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    batch_size = batch.len(),
                    "Album lookup failed"
                ),
            }
        }

        release_dates
    }

    async fn fetch_audio_features(
        &self,
        track_ids: &[String],
        access_token: &str,
    ) -> HashMap<String, ApiAudioFeatures> {
        let url = format!("{}/audio-features", self.api_url);
        let mut features = HashMap::new();

        for batch in track_ids.chunks(AUDIO_FEATURES_BATCH) {
            let ids = batch.join(",");
            match self
                .get_json::<ApiAudioFeaturesResponse>(&url, &[("ids", ids.as_str())], access_token)
                .await
            {
                Ok(response) => features.extend(
                    response
                        .audio_features
                        .into_iter()
                        .flatten()
                        .map(|f| (f.id.clone(), f)),
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    batch_size = batch.len(),
                    "Audio features lookup failed"
                ),
            }
        }

        features
    }
}

/// Spotify IDs are base62; anything else would escape the URL path segment
fn is_catalog_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Removes duplicates while keeping first-seen order
fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Joins the playlist entry with the looked-up metadata.
/// Returns `None` for local files, which have no catalog ID.
fn build_record(
    track: ApiPlaylistTrack,
    details: &HashMap<String, ApiTrackDetails>,
    release_dates: &HashMap<String, NaiveDate>,
    features: &HashMap<String, ApiAudioFeatures>,
) -> Option<TrackRecord> {
    let track_id = track.id?;
    let album_id = track.album.id.unwrap_or_default();
    let detail = details.get(&track_id);
    let audio = features.get(&track_id);

    Some(TrackRecord {
        artists: track
            .artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        album_name: track.album.name,
        release_date: release_dates.get(&album_id).copied(),
        popularity: detail.and_then(|d| d.popularity),
        explicit: detail.and_then(|d| d.explicit),
        external_url: detail.and_then(|d| d.external_urls.spotify.clone()),
        duration_ms: detail
            .and_then(|d| d.duration_ms)
            .or_else(|| audio.and_then(|a| a.duration_ms)),
        features: audio.cloned().map(AudioFeatures::from).unwrap_or_default(),
        name: track.name,
        track_id,
        album_id,
    })
}

#[async_trait::async_trait]
impl CatalogProvider for SpotifyCatalog {
    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        access_token: &str,
    ) -> AppResult<TrackTable> {
        if playlist_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Playlist ID cannot be empty".to_string(),
            ));
        }
        if !is_catalog_id(playlist_id) {
            return Err(AppError::InvalidInput(format!(
                "Invalid playlist ID: {}",
                playlist_id
            )));
        }

        let start = Instant::now();
        let playlist_tracks = self.fetch_playlist_tracks(playlist_id, access_token).await?;

        let track_ids = unique_ids(playlist_tracks.iter().filter_map(|t| t.id.as_deref()));
        let album_ids = unique_ids(playlist_tracks.iter().filter_map(|t| t.album.id.as_deref()));

        if track_ids.is_empty() {
            return Err(AppError::ExternalApi(format!(
                "Playlist {} has no catalog tracks",
                playlist_id
            )));
        }

        let (details, release_dates, features) = tokio::join!(
            self.fetch_track_details(&track_ids, access_token),
            self.fetch_release_dates(&album_ids, access_token),
            self.fetch_audio_features(&track_ids, access_token),
        );

        let table: TrackTable = playlist_tracks
            .into_iter()
            .filter_map(|track| build_record(track, &details, &release_dates, &features))
            .collect();

        tracing::info!(
            playlist_id = %playlist_id,
            tracks = table.len(),
            with_features = features.len(),
            with_release_date = release_dates.len(),
            processing_time_ms = start.elapsed().as_millis(),
            provider = "spotify",
            "Playlist fetched"
        );

        Ok(table)
    }

    fn name(&self) -> &'static str {
        "spotify"
    }
}
