/// Spotify OAuth 2.0 authorization-code flow
use chrono::Utc;
use reqwest::{Client as HttpClient, Url};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{ApiTokenResponse, TokenSet},
};

/// Permissions requested from the user
pub const OAUTH_SCOPE: &str = "user-read-private user-read-email";

/// Trait for OAuth identity providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OAuthClient: Send + Sync {
    /// URL the user is sent to for consent; `state` comes back on the callback
    fn authorize_url(&self, state: &str) -> AppResult<String>;

    /// Trades an authorization code for tokens
    async fn exchange_code(&self, code: &str) -> AppResult<TokenSet>;

    /// Obtains a fresh access token. The returned set keeps `refresh_token`
    /// when the provider does not rotate it.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenSet>;
}

#[derive(Clone)]
pub struct SpotifyOAuth {
    http_client: HttpClient,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
}

impl SpotifyOAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: HttpClient::new(),
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_url: config.spotify_auth_url.clone(),
            token_url: config.spotify_token_url.clone(),
        }
    }

    async fn request_tokens(
        &self,
        form: &[(&str, &str)],
        previous_refresh_token: Option<String>,
    ) -> AppResult<TokenSet> {
        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Token request rejected");
            return Err(AppError::Unauthorized(format!(
                "Token endpoint returned status {}: {}",
                status, body
            )));
        }

        let token_response: ApiTokenResponse = response.json().await?;
        Ok(TokenSet::from_response(
            token_response,
            Utc::now(),
            previous_refresh_token,
        ))
    }
}

#[async_trait::async_trait]
impl OAuthClient for SpotifyOAuth {
    fn authorize_url(&self, state: &str) -> AppResult<String> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", OAUTH_SCOPE),
                ("state", state),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Invalid authorization URL: {}", e)))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> AppResult<TokenSet> {
        let tokens = self
            .request_tokens(
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", self.redirect_uri.as_str()),
                ],
                None,
            )
            .await?;

        tracing::info!(expires_at = %tokens.expires_at, "Authorization code exchanged");
        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenSet> {
        let tokens = self
            .request_tokens(
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
                Some(refresh_token.to_string()),
            )
            .await?;

        tracing::info!(expires_at = %tokens.expires_at, "Access token refreshed");
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Form, http::HeaderMap, response::IntoResponse, routing::post, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn config(token_url: &str) -> Config {
        envy::from_iter(vec![
            ("SPOTIFY_CLIENT_ID".to_string(), "client".to_string()),
            ("SPOTIFY_CLIENT_SECRET".to_string(), "secret".to_string()),
            ("SPOTIFY_TOKEN_URL".to_string(), token_url.to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn test_authorize_url() {
        let oauth = SpotifyOAuth::new(&config("http://127.0.0.1:9/token"));
        let url = Url::parse(&oauth.authorize_url("xyz").unwrap()).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(params["client_id"], "client");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "http://localhost:8888/callback");
        assert_eq!(params["scope"], OAUTH_SCOPE);
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["show_dialog"], "true");
    }

    async fn token_endpoint(
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> axum::response::Response {
        // base64("client:secret")
        let expected = "Basic Y2xpZW50OnNlY3JldA==";
        if headers.get("authorization").and_then(|h| h.to_str().ok()) != Some(expected) {
            return axum::http::StatusCode::UNAUTHORIZED.into_response();
        }

        match form.get("grant_type").map(String::as_str) {
            Some("authorization_code") if form.get("code").map(String::as_str) == Some("good") => {
                Json(json!({
                    "access_token": "access-1",
                    "token_type": "Bearer",
                    "expires_in": 3600,
                    "refresh_token": "refresh-1"
                }))
                .into_response()
            }
            Some("refresh_token") => Json(json!({
                "access_token": "access-2",
                "token_type": "Bearer",
                "expires_in": 3600
            }))
            .into_response(),
            _ => (
                axum::http::StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_grant"})),
            )
                .into_response(),
        }
    }

    async fn spawn_token_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/token", listener.local_addr().unwrap());
        let app = Router::new().route("/api/token", post(token_endpoint));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        url
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let oauth = SpotifyOAuth::new(&config(&spawn_token_endpoint().await));

        let tokens = oauth.exchange_code("good").await.unwrap();

        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
        assert!(!tokens.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_exchange_bad_code_is_unauthorized() {
        let oauth = SpotifyOAuth::new(&config(&spawn_token_endpoint().await));

        let result = oauth.exchange_code("bad").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let oauth = SpotifyOAuth::new(&config(&spawn_token_endpoint().await));

        let tokens = oauth.refresh("refresh-1").await.unwrap();

        assert_eq!(tokens.access_token, "access-2");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
    }
}
