//! Firestore-backed session store.

use super::{generate_token, token_key, Session, SessionStore};
use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;

/// Sessions persisted in the `sessions` collection, keyed by token hash.
#[derive(Clone)]
pub struct FirestoreSessionStore {
    db: FirestoreDb,
    ttl: chrono::Duration,
}

impl FirestoreSessionStore {
    pub fn new(db: FirestoreDb, ttl: chrono::Duration) -> Self {
        Self { db, ttl }
    }

    async fn delete_key(&self, key: &str) -> Result<(), AppError> {
        self.db
            .get_client()?
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(key)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FirestoreSessionStore {
    async fn create(&self, user_id: &str) -> Result<(String, Session), AppError> {
        let token = generate_token()?;
        let session = Session::new(user_id, self.ttl);

        let _: () = self
            .db
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(token_key(&token))
            .object(&session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((token, session))
    }

    async fn resolve(&self, token: &str) -> Result<Option<Session>, AppError> {
        let key = token_key(token);
        let session: Option<Session> = self
            .db
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(&key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match session {
            Some(session) if session.is_expired_at(Utc::now()) => {
                if let Err(e) = self.delete_key(&key).await {
                    tracing::warn!(error = %e, "Failed to delete expired session");
                }
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn destroy(&self, token: &str) -> Result<(), AppError> {
        self.delete_key(&token_key(token)).await
    }
}
