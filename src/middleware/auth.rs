// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware and cookie helpers.

use crate::config::Config;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "sid";
/// Cookie binding an OAuth `state` to the browser that started the flow.
pub const OAUTH_NONCE_COOKIE: &str = "oauth_nonce";
/// Path the nonce cookie is scoped to.
pub const OAUTH_CALLBACK_PATH: &str = "/auth/google/callback";
/// Lifetime of a pending OAuth flow, in seconds.
pub const OAUTH_FLOW_TTL_SECS: i64 = 600;

/// Authenticated user resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Resolve the session cookie in `jar` to a live session.
///
/// Shared by [`require_auth`] and handlers that report, rather than
/// reject, an anonymous caller.
pub async fn authenticate(state: &AppState, jar: &CookieJar) -> Result<AuthUser, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::Unauthorized)?;

    match state.sessions.resolve(token).await? {
        Some(session) => Ok(AuthUser {
            user_id: session.user_id,
        }),
        None => {
            tracing::debug!("Session cookie did not resolve to a live session");
            Err(AppError::Unauthorized)
        }
    }
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(&state, &jar).await.map_err(|e| {
        tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        e
    })?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// SameSite mode for the session cookie. Browsers drop `SameSite=None`
/// cookies that are not also `Secure`.
fn session_same_site(config: &Config) -> SameSite {
    if config.cookie_secure {
        SameSite::None
    } else {
        SameSite::Lax
    }
}

/// Session cookie for a freshly created session.
pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(session_same_site(config))
        .max_age(config.session_max_age())
        .build()
}

/// Expired session cookie with the same attributes it was set with.
pub fn clear_session_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(session_same_site(config))
        .max_age(time::Duration::ZERO)
        .build()
}

/// Nonce cookie set when an OAuth flow starts.
///
/// The callback arrives as a top-level navigation from the provider, so
/// `Lax` is enough.
pub fn oauth_nonce_cookie(config: &Config, nonce: String) -> Cookie<'static> {
    Cookie::build((OAUTH_NONCE_COOKIE, nonce))
        .path(OAUTH_CALLBACK_PATH)
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(OAUTH_FLOW_TTL_SECS))
        .build()
}

pub fn clear_oauth_nonce_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((OAUTH_NONCE_COOKIE, ""))
        .path(OAUTH_CALLBACK_PATH)
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_dev_attributes() {
        let config = Config::test_default();
        let rendered = session_cookie(&config, "tok".to_string()).to_string();

        assert!(rendered.starts_with("sid=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Max-Age=604800"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_session_cookie_production_attributes() {
        let config = Config {
            cookie_secure: true,
            ..Config::test_default()
        };
        let rendered = session_cookie(&config, "tok".to_string()).to_string();

        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=None"));
        assert!(rendered.contains("HttpOnly"));
    }

    #[test]
    fn test_clear_cookies_expire_immediately() {
        let config = Config::test_default();

        let session = clear_session_cookie(&config).to_string();
        assert!(session.starts_with("sid=;"));
        assert!(session.contains("Max-Age=0"));
        assert!(session.contains("Path=/"));

        let nonce = clear_oauth_nonce_cookie(&config).to_string();
        assert!(nonce.contains("Max-Age=0"));
        assert!(nonce.contains("Path=/auth/google/callback"));
    }
}
