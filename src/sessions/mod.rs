// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side sessions.
//!
//! The cookie carries only an opaque random token. Stores key sessions by
//! the SHA-256 of that token, so the stored key cannot be replayed as a
//! cookie.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreSessionStore;
pub use memory::MemorySessionStore;

use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// A live login, bound to one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Fixed at creation; sessions are not extended on use
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: &str, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Session lookup abstraction; backends are swappable without touching
/// route logic.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a session for `user_id`. Returns the cookie token.
    async fn create(&self, user_id: &str) -> Result<(String, Session), AppError>;

    /// Resolve a cookie token to a live session. Expired sessions are
    /// removed and resolve to `None`.
    async fn resolve(&self, token: &str) -> Result<Option<Session>, AppError>;

    /// End the session for `token`. Unknown tokens are ignored.
    async fn destroy(&self, token: &str) -> Result<(), AppError>;
}

/// Generate a fresh cookie token (32 random bytes, base64url).
pub fn generate_token() -> Result<String, AppError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Storage key for a cookie token.
pub fn token_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_random_and_url_safe() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }

    #[test]
    fn test_session_expiry_saturates() {
        let session = Session::new("user-1", chrono::Duration::MAX);
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!session.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_token_key_is_stable_hex() {
        let key = token_key("abc");
        assert_eq!(key, token_key("abc"));
        assert_ne!(key, token_key("abd"));
        assert_eq!(key.len(), 64);
        assert_ne!(key, "abc");
    }

    #[test]
    fn test_session_expiry() {
        let session = Session::new("u1", chrono::Duration::days(7));
        assert!(!session.is_expired_at(Utc::now()));
        assert!(session.is_expired_at(session.created_at + chrono::Duration::days(7)));
    }
}
