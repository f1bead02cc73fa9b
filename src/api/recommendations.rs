use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use super::{auth, AppState};
use crate::{
    error::{AppError, AppResult, PLAYLIST_FAILURE_MESSAGE, RECOMMENDATION_FAILURE_MESSAGE},
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
};

/// Fetches the playlist and ranks it around `song_name`.
///
/// Shared by the JSON API and the HTML form.
pub async fn generate(
    state: &AppState,
    access_token: &str,
    playlist_id: &str,
    song_name: &str,
    num_recommendations: Option<usize>,
) -> AppResult<RecommendationResponse> {
    let playlist_id = playlist_id.trim();
    let song_name = song_name.trim();
    if playlist_id.is_empty() || song_name.is_empty() {
        return Err(AppError::InvalidInput(
            "playlist_id and song_name are required".to_string(),
        ));
    }
    if num_recommendations == Some(0) {
        return Err(AppError::InvalidInput(
            "num_recommendations must be at least 1".to_string(),
        ));
    }

    let table = state
        .catalog
        .fetch_playlist(playlist_id, access_token)
        .await
        .map_err(|e| match e {
            AppError::Unauthorized(_) | AppError::InvalidInput(_) => e,
            other => {
                tracing::warn!(
                    playlist_id = %playlist_id,
                    provider = state.catalog.name(),
                    error = %other,
                    "Playlist fetch failed"
                );
                AppError::ExternalApi(PLAYLIST_FAILURE_MESSAGE.to_string())
            }
        })?;

    let recommendations = state
        .ranker_for(num_recommendations)
        .recommend(song_name, &table);
    if !recommendations.success {
        return Err(AppError::Recommendation(
            RECOMMENDATION_FAILURE_MESSAGE.to_string(),
        ));
    }

    Ok(RecommendationResponse {
        playlist_tracks: table.track_names(),
        recommendations: recommendations.entries,
    })
}

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let access_token = auth::access_token(&state, &headers, &jar).await?;

    tracing::debug!(
        request_id = %request_id,
        playlist_id = %request.playlist_id,
        song_name = %request.song_name,
        "Recommendation request"
    );

    let response = generate(
        &state,
        &access_token,
        &request.playlist_id,
        &request.song_name,
        request.num_recommendations,
    )
    .await?;

    Ok(Json(response))
}
