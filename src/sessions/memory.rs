//! In-process session store.

use super::{generate_token, token_key, Session, SessionStore};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

/// Sessions held in a concurrent map; lost on restart.
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
    ttl: chrono::Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Number of stored sessions, including expired ones not yet resolved.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: &str) -> Result<(String, Session), AppError> {
        let token = generate_token()?;
        let session = Session::new(user_id, self.ttl);
        self.sessions.insert(token_key(&token), session.clone());
        Ok((token, session))
    }

    async fn resolve(&self, token: &str) -> Result<Option<Session>, AppError> {
        let key = token_key(token);
        let Some(session) = self.sessions.get(&key).map(|s| s.clone()) else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            self.sessions.remove(&key);
            tracing::debug!(user_id = %session.user_id, "Session expired");
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn destroy(&self, token: &str) -> Result<(), AppError> {
        self.sessions.remove(&token_key(token));
        Ok(())
    }
}
