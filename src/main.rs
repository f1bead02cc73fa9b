use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use playlist_recs::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, MemorySessionStore, RedisSessionStore, SessionStore},
    services::{SpotifyCatalog, SpotifyOAuth},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playlist_recs=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(redis_url) => Arc::new(RedisSessionStore::new(
            create_redis_client(redis_url)?,
            config.session_ttl_secs,
        )),
        None => Arc::new(MemorySessionStore::new(config.session_ttl_secs)),
    };
    tracing::info!(store = sessions.name(), "Session store ready");

    let state = AppState::new(
        &config,
        Arc::new(SpotifyCatalog::new(config.spotify_api_url.clone())),
        Arc::new(SpotifyOAuth::new(&config)),
        sessions,
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app).await?;
    Ok(())
}
