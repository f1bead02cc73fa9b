use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::{auth, recommendations::generate, AppState};
use crate::{
    error::AppError,
    models::{RecommendationEntry, RecommendationResponse},
};

#[derive(Debug, Deserialize)]
pub struct PlaylistForm {
    pub playlist_id: String,
    pub song_name: String,
}

const FORM: &str = "<form method=\"post\" action=\"/playlists\">\
    <label>Playlist ID <input name=\"playlist_id\" required></label>\
    <label>Song name <input name=\"song_name\" required></label>\
    <button type=\"submit\">Recommend</button>\
    </form>";

fn page(body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><body><h1>Playlist recommendations</h1>{}{}</body></html>",
        body, FORM
    ))
}

fn escape_html(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            c => c.to_string(),
        })
        .collect()
}

fn render_entry(entry: &RecommendationEntry) -> String {
    let released = entry
        .release_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "<li>{} by {} ({}, released {})</li>",
        escape_html(&entry.name),
        escape_html(&entry.artists),
        escape_html(&entry.album_name),
        released
    )
}

fn render_results(song_name: &str, response: &RecommendationResponse) -> String {
    let recommended: String = response.recommendations.iter().map(render_entry).collect();
    let tracks: String = response
        .playlist_tracks
        .iter()
        .map(|name| format!("<li>{}</li>", escape_html(name)))
        .collect();

    format!(
        "<h2>Because you like {}</h2><ol>{}</ol><h2>Playlist</h2><ul>{}</ul>",
        escape_html(song_name),
        recommended,
        tracks
    )
}

/// Shows the playlist form
pub async fn form(jar: CookieJar) -> Response {
    if jar.get(auth::SESSION_COOKIE).is_none() {
        return Redirect::to("/login").into_response();
    }
    page("").into_response()
}

/// Handles a form submission and renders the recommendations
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<PlaylistForm>,
) -> Response {
    let access_token = match auth::access_token(&state, &headers, &jar).await {
        Ok(token) => token,
        Err(AppError::Unauthorized(_)) => return Redirect::to("/login").into_response(),
        Err(e) => return e.into_response(),
    };

    match generate(&state, &access_token, &form.playlist_id, &form.song_name, None).await {
        Ok(response) => page(&render_results(form.song_name.trim(), &response)).into_response(),
        Err(AppError::Unauthorized(_)) => Redirect::to("/login").into_response(),
        Err(e) => {
            let status = e.status_code();
            let message = format!("<p class=\"error\">{}</p>", escape_html(&e.message()));
            (status, page(&message)).into_response()
        }
    }
}
