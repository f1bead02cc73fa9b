use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use uuid::Uuid;

use crate::db::SessionStore;
use crate::error::AppError;
use crate::error::AppResult;
use crate::models::TokenSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RedisKey {
    Session(Uuid),
}

impl Display for RedisKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedisKey::Session(id) => write!(f, "session:{}", id),
        }
    }
}

/// Creates a Redis client for session storage
///
/// Opening the client does not connect; connections are made per operation.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Session store backed by Redis, shared by every server instance
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_client: Client,
    ttl: u64,
}

impl RedisSessionStore {
    pub fn new(redis_client: Client, ttl: u64) -> Self {
        Self { redis_client, ttl }
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    /// Retrieves the session's tokens
    ///
    /// Expiry is left to Redis, so a missing key covers both unknown and
    /// expired sessions.
    async fn load(&self, session_id: &Uuid) -> AppResult<Option<TokenSet>> {
        let key = RedisKey::Session(*session_id);
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(format!("{}", key)).await?;

        match stored {
            Some(json) => {
                let tokens = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Session deserialization error: {}", e))
                })?;
                Ok(Some(tokens))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &Uuid, tokens: &TokenSet) -> AppResult<()> {
        let key = RedisKey::Session(*session_id);
        let json = serde_json::to_string(tokens)
            .map_err(|e| AppError::Internal(format!("Session serialization error: {}", e)))?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(format!("{}", key), json, self.ttl).await?;

        tracing::debug!(session_id = %session_id, ttl = self.ttl, "Session stored");
        Ok(())
    }

    async fn remove(&self, session_id: &Uuid) -> AppResult<()> {
        let key = RedisKey::Session(*session_id);
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(format!("{}", key)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
