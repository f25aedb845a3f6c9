// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use recipe_share::config::Config;
use recipe_share::db::{FirestoreDb, MemoryDb};
use recipe_share::error::AppError;
use recipe_share::routes::create_router;
use recipe_share::services::{IdentityProvider, ProviderIdentity};
use recipe_share::sessions::MemorySessionStore;
use recipe_share::storage::MemoryImageStore;
use recipe_share::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Identity provider stand-in.
///
/// The authorization code doubles as the external ID; the code `fail`
/// is rejected the way an invalid or replayed code would be.
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "https://accounts.example.test/auth?redirect_uri={}&state={}",
            urlencoding::encode(redirect_uri),
            state
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<ProviderIdentity, AppError> {
        if code == "fail" {
            return Err(AppError::Provider("invalid_grant".to_string()));
        }
        Ok(ProviderIdentity {
            external_id: code.to_string(),
            display_name: format!("Cook {code}"),
            email: format!("{code}@example.com"),
            avatar_url: Some(format!("https://photos.example.test/{code}.png")),
        })
    }
}

/// Router plus handles on the in-memory stores behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub sessions: Arc<MemorySessionStore>,
    pub images: Arc<MemoryImageStore>,
}

/// Create a test app backed by in-memory stores and a fake provider.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl()));
    let images = Arc::new(MemoryImageStore::new());

    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        db.clone(),
        sessions.clone(),
        images.clone(),
        Arc::new(FakeProvider),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        sessions,
        images,
    }
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Run the full sign-in flow for `external_id`. Returns the session token.
    pub async fn login(&self, external_id: &str) -> String {
        let (state, nonce) = self.begin_login().await;

        let response = self
            .send(
                Request::builder()
                    .uri(format!(
                        "/auth/google/callback?code={external_id}&state={state}"
                    ))
                    .header(header::COOKIE, format!("oauth_nonce={nonce}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let cookies = set_cookie_headers(&response);
        cookie_value(&find_cookie(&cookies, "sid")).to_string()
    }

    /// Start a sign-in. Returns the signed `state` and the nonce cookie value.
    pub async fn begin_login(&self) -> (String, String) {
        let response = self
            .send(
                Request::builder()
                    .uri("/auth/google")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let state = location
            .split_once("state=")
            .map(|(_, rest)| rest.split('&').next().unwrap_or(rest).to_string())
            .expect("state parameter in redirect");

        let cookies = set_cookie_headers(&response);
        let nonce = cookie_value(&find_cookie(&cookies, "oauth_nonce")).to_string();
        (state, nonce)
    }
}

/// Request carrying the session cookie.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("sid={token}"))
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Value part of a `Set-Cookie` header.
#[allow(dead_code)]
pub fn cookie_value(set_cookie: &str) -> &str {
    let pair = set_cookie.split(';').next().unwrap();
    pair.split_once('=').map(|(_, v)| v).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub const BOUNDARY: &str = "recipe-share-test-boundary";

/// Builder for `multipart/form-data` bodies.
#[allow(dead_code)]
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

#[allow(dead_code)]
impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Body {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(self.body)
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }
}

/// A complete valid recipe form.
#[allow(dead_code)]
pub fn soup_form(cooking_time: &str) -> MultipartBody {
    MultipartBody::new()
        .text("name", "Tomato soup")
        .text("description", "Simple and warm")
        .text("ingredients", "4 tomatoes")
        .text("ingredients", "1 onion")
        .text("instruction", "Chop, simmer, blend.")
        .text("cookingTime", cooking_time)
        .file("image", "soup.png", "image/png", b"\x89PNG\r\n\x1a\n")
}

/// Create a recipe through the API and return its JSON.
#[allow(dead_code)]
pub async fn create_recipe(app: &TestApp, token: &str) -> serde_json::Value {
    let response = app
        .send(
            authed("POST", "/recipes", token)
                .header(header::CONTENT_TYPE, MultipartBody::content_type())
                .body(soup_form("45").finish())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}
