// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity broker: maps a provider-proven identity to a local user and
//! opens a session for it.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::User;
use crate::sessions::{Session, SessionStore};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use std::sync::Arc;

/// Identity asserted by the external provider after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub external_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// External identity provider integration (Google in production).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the provider's consent screen.
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> String;

    /// Exchange a callback code for a verified identity.
    async fn exchange_code(&self, code: &str, redirect_uri: &str)
        -> Result<ProviderIdentity, AppError>;
}

/// Result of a completed sign-in.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Cookie token for the new session
    pub session_token: String,
    pub session: Session,
    pub created_user: bool,
}

/// OAuth identity broker.
pub struct IdentityBroker {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityBroker {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            users,
            sessions,
            provider,
        }
    }

    /// Provider redirect for starting sign-in. Creates no local state.
    pub fn begin_auth(&self, redirect_uri: &str, state: &str) -> String {
        self.provider.authorize_url(redirect_uri, state)
    }

    /// Finish sign-in: verify with the provider, find or create the user,
    /// and open exactly one session.
    pub async fn complete_auth(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<LoginOutcome, AppError> {
        let identity = self.provider.exchange_code(code, redirect_uri).await?;
        let (user, created_user) = self.find_or_create_user(&identity).await?;
        let (session_token, session) = self.sessions.create(&user.id).await?;

        tracing::info!(
            user_id = %user.id,
            created_user,
            "Sign-in complete, session created"
        );

        Ok(LoginOutcome {
            user,
            session_token,
            session,
            created_user,
        })
    }

    /// Look up the user by external ID, creating it on first sign-in.
    ///
    /// Returns the user and whether it was created.
    pub async fn find_or_create_user(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<(User, bool), AppError> {
        if let Some(user) = self
            .users
            .find_user_by_google_id(&identity.external_id)
            .await?
        {
            return Ok((user, false));
        }

        let email = identity.email.to_ascii_lowercase();
        if let Some(existing) = self.users.find_user_by_email(&email).await? {
            tracing::warn!(
                user_id = %existing.id,
                "Email already registered to a different Google account"
            );
            return Err(AppError::Validation(
                "Email is already registered to another account".to_string(),
            ));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            google_id: identity.external_id.clone(),
            display_name: identity.display_name.clone(),
            email,
            photo_url: identity.avatar_url.clone(),
            saved_recipes: Vec::new(),
            created_at: now_rfc3339(),
        };
        self.users.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "Created user on first sign-in");
        Ok((user, true))
    }

    /// Resolve a session cookie token to its live session.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        self.sessions.resolve(token).await
    }

    /// End the session for a cookie token.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.sessions.destroy(token).await
    }
}
