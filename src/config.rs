// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honored for local
//! development.

use std::env;
use std::path::PathBuf;

/// Which backend holds users, recipes and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Firestore,
    Memory,
}

impl DbBackend {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("DB_BACKEND", raw.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Client origin; OAuth success and logout redirect here
    pub frontend_url: String,
    /// Public base URL of this API (OAuth callback, image URLs)
    pub api_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Storage backend for users, recipes and sessions
    pub db_backend: DbBackend,
    /// Directory where uploaded images are written
    pub upload_dir: PathBuf,
    /// Fixed session lifetime in days
    pub session_ttl_days: i64,
    /// Mark cookies `Secure; SameSite=None` (cross-site production deploys)
    pub cookie_secure: bool,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// HMAC key for signing the OAuth state parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_url = first_var(&["API_URL", "BACKEND_URL"])
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let cookie_secure = match env::var("COOKIE_SECURE") {
            Ok(raw) => parse_bool("COOKIE_SECURE", &raw)?,
            Err(_) => api_url.starts_with("https://"),
        };

        let session_ttl_days = match env::var("SESSION_TTL_DAYS") {
            Ok(raw) => parse_session_ttl_days(&raw)?,
            Err(_) => 7,
        };

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            frontend_url: first_var(&["FRONTEND_URL", "CLIENT_URL"])
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            api_url,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            db_backend: match env::var("DB_BACKEND") {
                Ok(raw) => DbBackend::parse(&raw)?,
                Err(_) => DbBackend::Firestore,
            },
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            session_ttl_days,
            cookie_secure,

            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            api_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            db_backend: DbBackend::Memory,
            upload_dir: env::temp_dir().join("recipe-share-test-uploads"),
            session_ttl_days: 7,
            cookie_secure: false,
            google_client_secret: "test_secret".to_string(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!!".to_vec(),
        }
    }

    /// Redirect URI registered with Google for the OAuth callback.
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.api_url)
    }

    /// Session lifetime as a chrono duration, capped at
    /// [`MAX_SESSION_TTL_DAYS`].
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.capped_ttl_days())
    }

    /// Session cookie `Max-Age`, matching [`Config::session_ttl`].
    pub fn session_max_age(&self) -> time::Duration {
        time::Duration::days(self.capped_ttl_days())
    }

    fn capped_ttl_days(&self) -> i64 {
        self.session_ttl_days.clamp(0, MAX_SESSION_TTL_DAYS)
    }
}

/// Longest accepted session lifetime (about ten years).
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

fn parse_session_ttl_days(raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|days| (1..=MAX_SESSION_TTL_DAYS).contains(days))
        .ok_or_else(|| ConfigError::Invalid("SESSION_TTL_DAYS", raw.to_string()))
}

fn first_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env::var(name).ok())
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid(name, raw.to_string())),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
