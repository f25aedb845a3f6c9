// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 authorization-code client.
//!
//! Handles:
//! - Building the consent-screen redirect
//! - Exchanging the callback code for tokens
//! - Verifying the returned ID token into a provider identity

use crate::error::AppError;
use crate::services::google_oidc::GoogleIdTokenVerifier;
use crate::services::identity::{IdentityProvider, ProviderIdentity};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Requested scopes: basic profile plus email.
const SCOPES: &str = "openid profile email";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Google sign-in client.
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    verifier: GoogleIdTokenVerifier,
}

impl GoogleOAuthClient {
    /// Create a client with OAuth credentials and a JWKS-backed verifier.
    pub fn new(client_id: String, client_secret: String) -> anyhow::Result<Self> {
        let verifier = GoogleIdTokenVerifier::new(&client_id)?;
        Self::with_verifier(client_id, client_secret, TOKEN_URL.to_string(), verifier)
    }

    /// Create a client against a custom token endpoint and verifier.
    pub fn with_verifier(
        client_id: String,
        client_secret: String,
        token_url: String,
        verifier: GoogleIdTokenVerifier,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            client_id,
            client_secret,
            token_url,
            verifier,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}&\
             prompt=select_account",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ProviderIdentity, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Token exchange returned HTTP {}: {}",
                status, body
            )));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("JSON parse error: {}", e)))?;

        let identity = self
            .verifier
            .verify_id_token(&tokens.id_token)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        Ok(ProviderIdentity {
            display_name: identity
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| identity.email.clone()),
            external_id: identity.subject,
            email: identity.email,
            avatar_url: identity.picture,
        })
    }
}

/// Token endpoint response; only the ID token is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
}
