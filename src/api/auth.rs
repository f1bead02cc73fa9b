use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::{AppError, AppResult};

/// Cookie carrying the session ID after login
pub const SESSION_COOKIE: &str = "session_id";

/// Cookie carrying the CSRF state between `/login` and `/callback`
pub const STATE_COOKIE: &str = "oauth_state";

fn private_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Returns a usable access token for the session, refreshing it first when
/// it has expired
async fn session_access_token(state: &AppState, session_id: &Uuid) -> AppResult<String> {
    let tokens = state
        .sessions
        .load(session_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session expired, please log in again".to_string()))?;

    if !tokens.is_expired(Utc::now()) {
        return Ok(tokens.access_token);
    }

    let Some(refresh_token) = tokens.refresh_token else {
        state.sessions.remove(session_id).await?;
        return Err(AppError::Unauthorized(
            "Session expired, please log in again".to_string(),
        ));
    };

    let refreshed = state.oauth.refresh(&refresh_token).await?;
    state.sessions.save(session_id, &refreshed).await?;
    tracing::debug!(session_id = %session_id, "Session token refreshed");

    Ok(refreshed.access_token)
}

/// Resolves the caller's Spotify access token.
///
/// An `Authorization: Bearer` header wins over the session cookie.
pub async fn access_token(
    state: &AppState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> AppResult<String> {
    if let Some(token) = bearer_token(headers) {
        return Ok(token);
    }

    match session_id(jar) {
        Some(id) => session_access_token(state, &id).await,
        None => Err(AppError::Unauthorized("Not logged in".to_string())),
    }
}

/// Landing page
pub async fn index() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html><html><body>\
         <h1>Playlist recommendations</h1>\
         <p>Find songs in your playlist that sound like the one you love.</p>\
         <a href=\"/login\">Log in with Spotify</a>\
         </body></html>",
    )
}

/// Starts the authorization-code flow
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Redirect)> {
    let csrf_state = Uuid::new_v4().simple().to_string();
    let url = state.oauth.authorize_url(&csrf_state)?;

    let jar = jar.add(private_cookie(STATE_COOKIE, csrf_state));
    Ok((jar, Redirect::to(&url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Completes the authorization-code flow and opens a session
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> AppResult<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Authorization denied");
        return Err(AppError::InvalidInput(format!(
            "Authorization failed: {}",
            error
        )));
    }

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => {
            tracing::warn!("OAuth state mismatch");
            return Err(AppError::InvalidInput("State mismatch".to_string()));
        }
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing authorization code".to_string()))?;

    let tokens = state.oauth.exchange_code(&code).await?;
    let session_id = Uuid::new_v4();
    state.sessions.save(&session_id, &tokens).await?;

    tracing::info!(
        session_id = %session_id,
        store = state.sessions.name(),
        "Session created"
    );

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/"))
        .add(private_cookie(SESSION_COOKIE, session_id.to_string()));
    Ok((jar, Redirect::to("/playlists")))
}

/// Refreshes the session's token if it has expired
pub async fn refresh_token(State(state): State<AppState>, jar: CookieJar) -> AppResult<Redirect> {
    let Some(id) = session_id(&jar) else {
        return Ok(Redirect::to("/login"));
    };

    match session_access_token(&state, &id).await {
        Ok(_) => Ok(Redirect::to("/playlists")),
        Err(AppError::Unauthorized(_)) => Ok(Redirect::to("/login")),
        Err(e) => Err(e),
    }
}
