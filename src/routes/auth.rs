// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    authenticate, clear_oauth_nonce_cookie, clear_session_cookie, oauth_nonce_cookie,
    session_cookie, OAUTH_FLOW_TTL_SECS, OAUTH_NONCE_COOKIE, SESSION_COOKIE,
};
use crate::models::UserProfile;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

const FAILURE_PATH: &str = "/auth/failure";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route(FAILURE_PATH, get(auth_failure))
        .route("/auth/logout", get(logout))
        .route("/auth/user", get(current_user))
}

/// Start OAuth flow - redirect to Google's consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let nonce = generate_nonce()?;
    let now_ms = unix_millis()?;
    let oauth_state = sign_state(&nonce, now_ms, &state.config.oauth_state_key)?;

    let auth_url = state
        .identity
        .begin_auth(&state.config.oauth_callback_url(), &oauth_state);

    tracing::info!("Starting OAuth flow, redirecting to Google");

    let jar = jar.add(oauth_nonce_cookie(&state.config, nonce));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, create session.
///
/// Every failure redirects to the failure endpoint without creating a
/// session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let jar_without_nonce = jar.clone().add(clear_oauth_nonce_cookie(&state.config));

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return (jar_without_nonce, Redirect::temporary(FAILURE_PATH));
    }

    let (Some(code), Some(oauth_state)) = (params.code, params.state) else {
        tracing::warn!("OAuth callback missing code or state");
        return (jar_without_nonce, Redirect::temporary(FAILURE_PATH));
    };

    let now_ms = match unix_millis() {
        Ok(now_ms) => now_ms,
        Err(e) => {
            tracing::error!(error = %e, "System time error during OAuth callback");
            return (jar_without_nonce, Redirect::temporary(FAILURE_PATH));
        }
    };

    let nonce = jar.get(OAUTH_NONCE_COOKIE).map(|c| c.value().to_string());
    if let Err(reason) = verify_state(
        &oauth_state,
        nonce.as_deref(),
        now_ms,
        &state.config.oauth_state_key,
    ) {
        tracing::warn!(reason, "Rejected OAuth state");
        return (jar_without_nonce, Redirect::temporary(FAILURE_PATH));
    }

    tracing::info!("Exchanging authorization code for tokens");

    let outcome = match state
        .identity
        .complete_auth(&code, &state.config.oauth_callback_url())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "OAuth sign-in failed");
            return (jar_without_nonce, Redirect::temporary(FAILURE_PATH));
        }
    };

    let jar = jar_without_nonce.add(session_cookie(&state.config, outcome.session_token));
    (jar, Redirect::temporary(&state.config.frontend_url))
}

#[derive(Serialize)]
struct FailureResponse {
    message: &'static str,
}

async fn auth_failure() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(FailureResponse {
            message: "Authentication Failed",
        }),
    )
        .into_response()
}

/// Logout - destroy the session and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.identity.logout(cookie.value()).await?;
        tracing::info!("Session destroyed on logout");
    }

    let jar = jar.add(clear_session_cookie(&state.config));
    Ok((jar, Redirect::temporary(&state.config.frontend_url)))
}

#[derive(Serialize)]
struct CurrentUserResponse {
    user: Option<UserProfile>,
}

/// Profile of the signed-in user, or 401 with `{ "user": null }`.
async fn current_user(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let anonymous = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(CurrentUserResponse { user: None }),
        )
            .into_response()
    };

    let auth_user = match authenticate(&state, &jar).await {
        Ok(auth_user) => auth_user,
        Err(AppError::Unauthorized) => return Ok(anonymous()),
        Err(e) => return Err(e),
    };

    match state.users.get_user(&auth_user.user_id).await? {
        Some(user) => Ok(Json(CurrentUserResponse {
            user: Some(user.into()),
        })
        .into_response()),
        None => {
            tracing::warn!(user_id = %auth_user.user_id, "Session refers to missing user");
            Ok(anonymous())
        }
    }
}

fn generate_nonce() -> Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn unix_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

fn state_mac(payload: &str, secret: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Build the OAuth `state` parameter: base64url("nonce|timestamp_hex|signature_hex").
pub fn sign_state(nonce: &str, timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", nonce, timestamp_ms);
    let signature = state_mac(&payload, secret)?.finalize().into_bytes();
    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Check an OAuth `state` against the nonce cookie and the clock.
///
/// Returns the reason on failure, for logging.
pub fn verify_state(
    state: &str,
    cookie_nonce: Option<&str>,
    now_ms: u128,
    secret: &[u8],
) -> std::result::Result<(), &'static str> {
    let bytes = URL_SAFE_NO_PAD.decode(state).map_err(|_| "not base64")?;
    let state_str = String::from_utf8(bytes).map_err(|_| "not utf-8")?;

    // Format is "nonce|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let [nonce, timestamp_hex, signature_hex] = parts[..] else {
        return Err("malformed");
    };

    let signature = hex::decode(signature_hex).map_err(|_| "malformed signature")?;
    let payload = format!("{}|{}", nonce, timestamp_hex);
    state_mac(&payload, secret)
        .map_err(|_| "bad key")?
        .verify_slice(&signature)
        .map_err(|_| "signature mismatch")?;

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).map_err(|_| "bad timestamp")?;
    let max_age_ms = OAUTH_FLOW_TTL_SECS as u128 * 1000;
    if now_ms.saturating_sub(issued_ms) > max_age_ms {
        return Err("expired");
    }
    if issued_ms > now_ms + 60_000 {
        return Err("issued in the future");
    }

    match cookie_nonce {
        Some(cookie_nonce) if cookie_nonce == nonce => Ok(()),
        Some(_) => Err("nonce mismatch"),
        None => Err("missing nonce cookie"),
    }
}
