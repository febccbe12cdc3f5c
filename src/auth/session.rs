use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::auth::token;
use crate::error::ApiError;

/// Server-side session state. The client only holds the opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub logged_in: bool,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::Internal(err.into())
    }
}

/// Create/read/update/destroy of sessions by raw client token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Issue a fresh anonymous session. Returns the raw token for the cookie.
    async fn create(&self) -> Result<(String, Session), SessionError>;

    /// Expired sessions are reported as absent.
    async fn load(&self, token: &str) -> Result<Option<Session>, SessionError>;

    async fn save(&self, token: &str, session: &Session) -> Result<(), SessionError>;

    async fn destroy(&self, token: &str) -> Result<(), SessionError>;

    /// Drop every expired session. Returns how many were removed.
    async fn purge_expired(&self) -> usize;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

/// Sessions held in process memory, keyed by token hash.
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_SESSION_TTL_SECS))
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self) -> Result<(String, Session), SessionError> {
        let (raw, hash) = token::generate_session_token();
        let session = Session {
            logged_in: false,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(hash, session.clone());
        Ok((raw, session))
    }

    async fn load(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let hash = token::hash_token(token);
        let now = Utc::now();
        let found = self.sessions.get(&hash).map(|s| s.clone());
        match found {
            Some(session) if session.is_expired(now) => {
                self.sessions.remove(&hash);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn save(&self, token: &str, session: &Session) -> Result<(), SessionError> {
        self.sessions.insert(token::hash_token(token), session.clone());
        Ok(())
    }

    async fn destroy(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.remove(&token::hash_token(token));
        Ok(())
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }
}

/// Periodically purge expired sessions until the runtime shuts down.
pub async fn run_sweeper(store: std::sync::Arc<dyn SessionStore>, period: std::time::Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let removed = store.purge_expired().await;
        if removed > 0 {
            tracing::debug!(removed, "purged expired sessions");
        }
    }
}
