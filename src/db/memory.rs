// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user and recipe store.
//!
//! Used for local development (`DB_BACKEND=memory`) and tests. Data is lost
//! on restart.

use crate::db::{add_to_saved, remove_from_saved, RecipeStore, UserStore};
use crate::error::AppError;
use crate::models::{Recipe, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Users and recipes held in concurrent maps.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    /// google_id -> user id
    google_index: DashMap<String, String>,
    recipes: DashMap<String, Recipe>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored recipes.
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Update a user's saved list under the map's per-entry lock, so
    /// concurrent saves for one user cannot lose each other's writes.
    fn update_saved<F>(&self, user_id: &str, recipe_id: &str, apply: F) -> Result<Vec<String>, AppError>
    where
        F: FnOnce(&mut Vec<String>, &str) -> bool,
    {
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        apply(&mut user.saved_recipes, recipe_id);
        Ok(user.saved_recipes.clone())
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.google_index.get(google_id).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.get_user(&user_id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.clone()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.google_index.entry(user.google_id.clone()) {
            Entry::Occupied(_) => Err(AppError::Validation(format!(
                "A user with Google ID {} already exists",
                user.google_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }

    async fn add_saved_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Vec<String>, AppError> {
        self.update_saved(user_id, recipe_id, add_to_saved)
    }

    async fn remove_saved_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Vec<String>, AppError> {
        self.update_saved(user_id, recipe_id, remove_from_saved)
    }
}

#[async_trait]
impl RecipeStore for MemoryDb {
    async fn get_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, AppError> {
        Ok(self.recipes.get(recipe_id).map(|r| r.clone()))
    }

    async fn get_recipes(&self, recipe_ids: &[String]) -> Result<Vec<Recipe>, AppError> {
        Ok(recipe_ids
            .iter()
            .filter_map(|id| self.recipes.get(id).map(|r| r.clone()))
            .collect())
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        let mut recipes: Vec<Recipe> = self.recipes.iter().map(|r| r.clone()).collect();
        // Newest first; ID breaks ties between identical timestamps
        recipes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(recipes)
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        self.recipes.insert(recipe.id.clone(), recipe.clone());
        Ok(())
    }
}
