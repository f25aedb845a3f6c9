// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe business logic: creation with image upload, owner-resolved reads,
//! and the per-user saved list.

use crate::db::{RecipeStore, UserStore};
use crate::error::AppError;
use crate::models::{NewRecipe, OwnerSummary, Recipe, RecipeView, User};
use crate::storage::{ext_from_mime, ImageStore};
use crate::time_utils::now_rfc3339;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

/// Uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Clone)]
pub struct RecipeService {
    users: Arc<dyn UserStore>,
    recipes: Arc<dyn RecipeStore>,
    images: Arc<dyn ImageStore>,
}

impl RecipeService {
    pub fn new(
        users: Arc<dyn UserStore>,
        recipes: Arc<dyn RecipeStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            users,
            recipes,
            images,
        }
    }

    /// Validate, store the image, then persist the recipe owned by `user_id`.
    ///
    /// Nothing is written unless every input check passes, and no record is
    /// created if the image cannot be stored.
    pub async fn create_recipe(
        &self,
        user_id: &str,
        new: NewRecipe,
        image: Option<ImageUpload>,
    ) -> Result<RecipeView, AppError> {
        new.validate()?;

        let image = image.ok_or_else(|| AppError::Validation("image is required".to_string()))?;
        if image.bytes.is_empty() {
            return Err(AppError::Validation("image is empty".to_string()));
        }
        let ext = ext_from_mime(&image.content_type).ok_or_else(|| {
            AppError::Validation(format!(
                "unsupported image type: {}",
                image.content_type
            ))
        })?;

        let owner = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        let recipe_id = uuid::Uuid::new_v4().to_string();
        let key = format!("recipes/{}.{}", recipe_id, ext);
        let image_url = self
            .images
            .put_image(&key, image.bytes, &image.content_type)
            .await
            .map_err(|e| AppError::Storage(format!("{e:#}")))?;

        let recipe = Recipe {
            id: recipe_id,
            name: new.name,
            description: new.description,
            ingredients: new.ingredients,
            instruction: new.instruction,
            image_url,
            // Range-checked by validation above
            cooking_time: new.cooking_time as u32,
            user_owner: owner.id.clone(),
            created_at: now_rfc3339(),
        };
        self.recipes.insert_recipe(&recipe).await?;

        tracing::info!(
            user_id = %owner.id,
            recipe_id = %recipe.id,
            "Recipe created"
        );
        Ok(RecipeView::new(recipe, Some(OwnerSummary::from(&owner))))
    }

    /// All recipes, newest first, with owners resolved.
    pub async fn list_recipes(&self) -> Result<Vec<RecipeView>, AppError> {
        let recipes = self.recipes.list_recipes().await?;
        self.with_owners(recipes).await
    }

    /// One recipe with its owner resolved.
    pub async fn get_recipe(&self, recipe_id: &str) -> Result<RecipeView, AppError> {
        let recipe = self
            .recipes
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("recipe {recipe_id}")))?;

        let owner = self.users.get_user(&recipe.user_owner).await?;
        Ok(RecipeView::new(
            recipe,
            owner.as_ref().map(OwnerSummary::from),
        ))
    }

    /// Add `recipe_id` to the user's saved list. Saving twice is a no-op.
    pub async fn save_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Vec<String>, AppError> {
        if self.recipes.get_recipe(recipe_id).await?.is_none() {
            return Err(AppError::NotFound(format!("recipe {recipe_id}")));
        }

        let saved = self.users.add_saved_recipe(user_id, recipe_id).await?;
        tracing::info!(user_id, recipe_id, saved = saved.len(), "Recipe saved");
        Ok(saved)
    }

    /// Remove `recipe_id` from the user's saved list if present.
    pub async fn unsave_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let saved = self.users.remove_saved_recipe(user_id, recipe_id).await?;
        tracing::info!(user_id, recipe_id, saved = saved.len(), "Recipe unsaved");
        Ok(saved)
    }

    /// The user's saved recipes in save order. Ids whose recipe no longer
    /// exists are skipped.
    pub async fn list_saved(&self, user_id: &str) -> Result<Vec<RecipeView>, AppError> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        let recipes = self.recipes.get_recipes(&user.saved_recipes).await?;
        if recipes.len() != user.saved_recipes.len() {
            tracing::warn!(
                user_id,
                stale = user.saved_recipes.len() - recipes.len(),
                "Saved list references missing recipes"
            );
        }

        self.with_owners(recipes).await
    }

    /// Resolve owners for a batch of recipes with one user lookup.
    async fn with_owners(&self, recipes: Vec<Recipe>) -> Result<Vec<RecipeView>, AppError> {
        let mut owner_ids: Vec<String> = recipes.iter().map(|r| r.user_owner.clone()).collect();
        owner_ids.sort();
        owner_ids.dedup();

        let owners: HashMap<String, User> = self
            .users
            .get_users(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let owner = owners.get(&recipe.user_owner).map(OwnerSummary::from);
                RecipeView::new(recipe, owner)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::storage::MemoryImageStore;

    struct Fixture {
        service: RecipeService,
        db: Arc<MemoryDb>,
        images: Arc<MemoryImageStore>,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(MemoryDb::new());
        let images = Arc::new(MemoryImageStore::new());
        db.insert_user(&user("user-a", "Alice")).await.unwrap();
        let service = RecipeService::new(db.clone(), db.clone(), images.clone());
        Fixture {
            service,
            db,
            images,
        }
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            google_id: format!("google-{id}"),
            display_name: name.to_string(),
            email: format!("{id}@example.com"),
            photo_url: Some(format!("https://photos.invalid/{id}.png")),
            saved_recipes: Vec::new(),
            created_at: now_rfc3339(),
        }
    }

    fn soup(cooking_time: i64) -> NewRecipe {
        NewRecipe::new(
            "Tomato soup",
            "Simple and warm",
            vec!["4 tomatoes".to_string(), "  ".to_string(), "1 onion".to_string()],
            "Chop, simmer, blend.",
            cooking_time,
        )
    }

    fn png() -> Option<ImageUpload> {
        Some(ImageUpload {
            bytes: Bytes::from_static(b"\x89PNG"),
            content_type: "image/png".to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_then_get_resolves_owner() {
        let f = fixture().await;

        let created = f.service.create_recipe("user-a", soup(45), png()).await.unwrap();
        assert_eq!(created.ingredients, vec!["4 tomatoes", "1 onion"]);
        assert_eq!(created.cooking_time, 45);
        assert!(created.image_url.ends_with(".png"));

        let fetched = f.service.get_recipe(&created.id).await.unwrap();
        let owner = fetched.user_owner.unwrap();
        assert_eq!(owner.id, "user-a");
        assert_eq!(owner.display_name, "Alice");
        assert_eq!(f.images.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_cooking_time_rejected_without_writes() {
        let f = fixture().await;

        let err = f
            .service
            .create_recipe("user-a", soup(0), png())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.db.recipe_count(), 0);
        assert!(f.images.is_empty());
    }

    #[tokio::test]
    async fn test_blank_ingredients_rejected() {
        let f = fixture().await;
        let new = NewRecipe::new("n", "d", vec![" ".to_string()], "i", 10);

        let err = f.service.create_recipe("user-a", new, png()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.db.recipe_count(), 0);
    }

    #[tokio::test]
    async fn test_image_required_and_typed() {
        let f = fixture().await;

        let missing = f.service.create_recipe("user-a", soup(10), None).await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let empty = ImageUpload {
            bytes: Bytes::new(),
            content_type: "image/png".to_string(),
        };
        let empty = f.service.create_recipe("user-a", soup(10), Some(empty)).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let pdf = ImageUpload {
            bytes: Bytes::from_static(b"%PDF"),
            content_type: "application/pdf".to_string(),
        };
        let pdf = f.service.create_recipe("user-a", soup(10), Some(pdf)).await;
        assert!(matches!(pdf, Err(AppError::Validation(_))));

        assert_eq!(f.db.recipe_count(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_creates_no_record() {
        let f = fixture().await;
        f.images.set_failing(true);

        let err = f
            .service
            .create_recipe("user-a", soup(30), png())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(f.db.recipe_count(), 0);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_owner() {
        let f = fixture().await;
        f.db.insert_user(&user("user-b", "Bob")).await.unwrap();

        let first = f.service.create_recipe("user-a", soup(10), png()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = f.service.create_recipe("user-b", soup(20), png()).await.unwrap();

        let listed = f.service.list_recipes().await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_eq!(listed[0].user_owner.as_ref().unwrap().display_name, "Bob");
        assert_eq!(listed[1].user_owner.as_ref().unwrap().display_name, "Alice");
    }

    #[tokio::test]
    async fn test_get_unknown_recipe_not_found() {
        let f = fixture().await;
        let err = f.service.get_recipe("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_idempotent_and_unsave() {
        let f = fixture().await;
        let r = f.service.create_recipe("user-a", soup(45), png()).await.unwrap();

        assert_eq!(f.service.save_recipe("user-a", &r.id).await.unwrap(), vec![r.id.clone()]);
        assert_eq!(f.service.save_recipe("user-a", &r.id).await.unwrap(), vec![r.id.clone()]);

        let saved = f.service.list_saved("user-a").await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, r.id);

        assert!(f.service.unsave_recipe("user-a", &r.id).await.unwrap().is_empty());
        assert!(f.service.unsave_recipe("user-a", &r.id).await.unwrap().is_empty());
        assert!(f.service.list_saved("user-a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_missing_recipe_not_found() {
        let f = fixture().await;
        let err = f.service.save_recipe("user-a", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.service.list_saved("user-a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_list_keeps_save_order() {
        let f = fixture().await;
        let a = f.service.create_recipe("user-a", soup(10), png()).await.unwrap();
        let b = f.service.create_recipe("user-a", soup(20), png()).await.unwrap();

        f.service.save_recipe("user-a", &b.id).await.unwrap();
        f.service.save_recipe("user-a", &a.id).await.unwrap();

        let saved = f.service.list_saved("user-a").await.unwrap();
        let ids: Vec<&str> = saved.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str()]);
    }

    #[tokio::test]
    async fn test_stale_saved_ids_skipped() {
        let f = fixture().await;
        let r = f.service.create_recipe("user-a", soup(10), png()).await.unwrap();
        f.service.save_recipe("user-a", &r.id).await.unwrap();
        // Simulate a recipe removed outside the API
        f.db.add_saved_recipe("user-a", "gone").await.unwrap();

        let saved = f.service.list_saved("user-a").await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, r.id);
    }
}
