use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::AppResult, models::TokenSet};

/// Storage for logged-in users' OAuth tokens, keyed by session ID
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the tokens for `session_id`, or `None` if unknown or expired
    async fn load(&self, session_id: &Uuid) -> AppResult<Option<TokenSet>>;

    /// Creates or replaces the tokens for `session_id`
    async fn save(&self, session_id: &Uuid, tokens: &TokenSet) -> AppResult<()>;

    async fn remove(&self, session_id: &Uuid) -> AppResult<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

struct StoredSession {
    tokens: TokenSet,
    evict_at: DateTime<Utc>,
}

/// Process-local session store used when no Redis URL is configured
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs.min(i32::MAX as u64) as i64),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &Uuid) -> AppResult<Option<TokenSet>> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(stored) if stored.evict_at > now => return Ok(Some(stored.tokens.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        self.sessions.write().await.remove(session_id);
        Ok(None)
    }

    /// Also sweeps expired sessions, so ones never read again do not pile up
    async fn save(&self, session_id: &Uuid, tokens: &TokenSet) -> AppResult<()> {
        let now = Utc::now();
        let stored = StoredSession {
            tokens: tokens.clone(),
            evict_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.evict_at > now);
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!(swept, "Expired sessions evicted");
        }
        sessions.insert(*session_id, stored);
        Ok(())
    }

    async fn remove(&self, session_id: &Uuid) -> AppResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
