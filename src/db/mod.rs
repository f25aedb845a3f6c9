//! Database layer: user and recipe stores.
//!
//! Handlers and services only see the [`UserStore`] and [`RecipeStore`]
//! traits. Firestore is the production backend; [`MemoryDb`] backs local
//! development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Recipe, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const RECIPES: &str = "recipes";
    /// Sessions keyed by the SHA-256 of their cookie token
    pub const SESSIONS: &str = "sessions";
}

/// Persisted users and their saved-recipe lists.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by local ID.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Get several users; unknown IDs are skipped.
    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError>;

    /// Look up a user by Google account subject.
    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError>;

    /// Look up a user by email address.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Store a new user.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    /// Append `recipe_id` to the user's saved list unless already present.
    ///
    /// Returns the saved list after the update. Fails with `NotFound` if
    /// the user does not exist.
    async fn add_saved_recipe(&self, user_id: &str, recipe_id: &str)
        -> Result<Vec<String>, AppError>;

    /// Remove `recipe_id` from the user's saved list if present.
    ///
    /// Returns the saved list after the update. Fails with `NotFound` if
    /// the user does not exist.
    async fn remove_saved_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Vec<String>, AppError>;
}

/// Persisted recipes.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Get a recipe by ID.
    async fn get_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, AppError>;

    /// Get several recipes in the order given; unknown IDs are skipped.
    async fn get_recipes(&self, recipe_ids: &[String]) -> Result<Vec<Recipe>, AppError>;

    /// All recipes, newest first.
    async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError>;

    /// Store a new recipe.
    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError>;
}

/// Apply an idempotent add to a saved list. Returns `true` if it changed.
pub(crate) fn add_to_saved(saved: &mut Vec<String>, recipe_id: &str) -> bool {
    if saved.iter().any(|id| id == recipe_id) {
        return false;
    }
    saved.push(recipe_id.to_string());
    true
}

/// Apply an idempotent remove to a saved list. Returns `true` if it changed.
pub(crate) fn remove_from_saved(saved: &mut Vec<String>, recipe_id: &str) -> bool {
    let before = saved.len();
    saved.retain(|id| id != recipe_id);
    saved.len() != before
}
