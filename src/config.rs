use serde::Deserialize;

use crate::services::recommendations::{PopularityBlend, DEFAULT_NUM_RECOMMENDATIONS};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Spotify application client ID
    pub spotify_client_id: String,

    /// Spotify application client secret
    pub spotify_client_secret: String,

    /// OAuth redirect URI registered with the Spotify application
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Spotify authorization endpoint
    #[serde(default = "default_auth_url")]
    pub spotify_auth_url: String,

    /// Spotify token endpoint
    #[serde(default = "default_token_url")]
    pub spotify_token_url: String,

    /// Spotify Web API base URL
    #[serde(default = "default_api_url")]
    pub spotify_api_url: String,

    /// Redis connection URL for sessions; sessions stay in memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// How long a login session is kept, in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Number of tracks recommended when the request does not say
    #[serde(default = "default_num_recommendations")]
    pub num_recommendations: usize,

    /// Sort key used when merging the seed into the recommendations
    #[serde(default)]
    pub popularity_blend: PopularityBlend,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redirect_uri() -> String {
    "http://localhost:8888/callback".to_string()
}

fn default_auth_url() -> String {
    "https://accounts.spotify.com/authorize".to_string()
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_session_ttl() -> u64 {
    604800 // 1 week
}

fn default_num_recommendations() -> usize {
    DEFAULT_NUM_RECOMMENDATIONS
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?
            .validated()
    }

    fn validated(self) -> anyhow::Result<Self> {
        if self.num_recommendations == 0 {
            anyhow::bail!("NUM_RECOMMENDATIONS must be at least 1");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut vars = vec![
            ("SPOTIFY_CLIENT_ID".to_string(), "client".to_string()),
            ("SPOTIFY_CLIENT_SECRET".to_string(), "secret".to_string()),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        vars
    }

    #[test]
    fn test_defaults() {
        let config: Config = envy::from_iter(vars(&[])).unwrap();

        assert_eq!(config.redirect_uri, "http://localhost:8888/callback");
        assert_eq!(config.spotify_api_url, "https://api.spotify.com/v1");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.num_recommendations, 5);
        assert_eq!(config.popularity_blend, PopularityBlend::Literal);
        assert_eq!(config.port, 8888);
    }

    #[test]
    fn test_overrides() {
        let config: Config = envy::from_iter(vars(&[
            ("REDIS_URL", "redis://cache:6379"),
            ("NUM_RECOMMENDATIONS", "10"),
            ("POPULARITY_BLEND", "recency_weighted"),
            ("PORT", "3000"),
        ]))
        .unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.num_recommendations, 10);
        assert_eq!(config.popularity_blend, PopularityBlend::RecencyWeighted);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_missing_credentials_fail() {
        let result = envy::from_iter::<_, Config>(Vec::<(String, String)>::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_recommendations_is_rejected() {
        let config: Config = envy::from_iter(vars(&[("NUM_RECOMMENDATIONS", "0")])).unwrap();
        let err = config.validated().unwrap_err();
        assert!(err.to_string().contains("NUM_RECOMMENDATIONS"));

        let config: Config = envy::from_iter(vars(&[("NUM_RECOMMENDATIONS", "3")])).unwrap();
        assert_eq!(config.validated().unwrap().num_recommendations, 3);
    }
}
