// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe Share API Server
//!
//! Serves the recipe REST API, Google sign-in, and uploaded recipe photos.

use recipe_share::{
    config::{Config, DbBackend},
    db::{FirestoreDb, MemoryDb, RecipeStore, UserStore},
    services::{GoogleOAuthClient, IdentityProvider},
    sessions::{FirestoreSessionStore, MemorySessionStore, SessionStore},
    storage::{ImageStore, LocalImageStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.db_backend, "Starting Recipe Share API");

    let (users, recipes, sessions): (
        Arc<dyn UserStore>,
        Arc<dyn RecipeStore>,
        Arc<dyn SessionStore>,
    ) = match config.db_backend {
        DbBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            let sessions = FirestoreSessionStore::new(db.clone(), config.session_ttl());
            let db = Arc::new(db);
            (db.clone(), db, Arc::new(sessions))
        }
        DbBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let db = Arc::new(MemoryDb::new());
            let sessions = MemorySessionStore::new(config.session_ttl());
            (db.clone(), db, Arc::new(sessions))
        }
    };

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
        &config.upload_dir,
        &format!("{}/uploads", config.api_url),
    ));
    tracing::info!(dir = %config.upload_dir.display(), "Image storage initialized");

    let provider: Arc<dyn IdentityProvider> = Arc::new(GoogleOAuthClient::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    )?);

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        users,
        recipes,
        sessions,
        images,
        provider,
    ));

    // Build router
    let app = recipe_share::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("recipe_share=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
