// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recipe Share: a recipe-sharing backend with Google sign-in.
//!
//! This crate provides the REST API for publishing recipes with photos,
//! browsing them, and keeping a personal list of saved recipes.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod sessions;
pub mod storage;
pub mod time_utils;

use config::Config;
use db::{RecipeStore, UserStore};
use services::{IdentityBroker, IdentityProvider, RecipeService};
use sessions::SessionStore;
use std::sync::Arc;
use storage::ImageStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub identity: IdentityBroker,
    pub recipe_service: RecipeService,
}

impl AppState {
    /// Wire the stores and collaborators into the services that use them.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        recipes: Arc<dyn RecipeStore>,
        sessions: Arc<dyn SessionStore>,
        images: Arc<dyn ImageStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let identity = IdentityBroker::new(users.clone(), sessions.clone(), provider);
        let recipe_service = RecipeService::new(users.clone(), recipes, images);

        Self {
            config,
            users,
            sessions,
            identity,
            recipe_service,
        }
    }
}
