// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe routes: public browsing plus authenticated create and saved list.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewRecipe, RecipeView};
use crate::services::ImageUpload;
use crate::AppState;
use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on a recipe upload request, image included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Routes open to anonymous callers.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/{id}", get(get_recipe))
}

/// Routes that need a session.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/recipes",
            post(create_recipe).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/recipes/save", put(save_recipe))
        .route("/recipes/saved", get(list_saved))
        .route("/recipes/saved/{recipe_id}", delete(unsave_recipe))
}

// ─── Browsing ────────────────────────────────────────────────

/// All recipes, newest first.
async fn list_recipes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<RecipeView>>> {
    Ok(Json(state.recipe_service.list_recipes().await?))
}

async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RecipeView>> {
    Ok(Json(state.recipe_service.get_recipe(&id).await?))
}

// ─── Creation ────────────────────────────────────────────────

/// Create a recipe from a multipart form.
///
/// Text fields: `name`, `description`, `instruction`, `cookingTime`, and
/// `ingredients` (repeated, or a single JSON array). File field: `image`.
async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<RecipeView>)> {
    let form = RecipeForm::read(multipart?).await?;
    let (new_recipe, image) = form.into_parts()?;

    let created = state
        .recipe_service
        .create_recipe(&user.user_id, new_recipe, image)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Raw multipart fields before validation.
#[derive(Debug, Default)]
struct RecipeForm {
    name: String,
    description: String,
    ingredients: Vec<String>,
    instruction: String,
    cooking_time: Option<String>,
    image: Option<ImageUpload>,
}

impl RecipeForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => form.image = Some(read_image(field).await?),
                "name" => form.name = field_text(field).await?,
                "description" => form.description = field_text(field).await?,
                "instruction" => form.instruction = field_text(field).await?,
                "cookingTime" => form.cooking_time = Some(field_text(field).await?),
                "ingredients" | "ingredients[]" => {
                    let text = field_text(field).await?;
                    form.ingredients.extend(parse_ingredients(&text));
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown form field");
                }
            }
        }

        Ok(form)
    }

    fn into_parts(self) -> Result<(NewRecipe, Option<ImageUpload>)> {
        let raw = self
            .cooking_time
            .ok_or_else(|| AppError::Validation("cookingTime is required".to_string()))?;
        let cooking_time: i64 = raw
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("cookingTime is not a number: {raw:?}")))?;

        let new_recipe = NewRecipe::new(
            &self.name,
            &self.description,
            self.ingredients,
            &self.instruction,
            cooking_time,
        );
        Ok((new_recipe, self.image))
    }
}

/// An `ingredients` value is either one line or a JSON array of lines.
fn parse_ingredients(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        if let Ok(lines) = serde_json::from_str::<Vec<String>>(trimmed) {
            return lines;
        }
    }
    vec![text.to_string()]
}

async fn field_text(field: Field<'_>) -> Result<String> {
    field.text().await.map_err(multipart_error)
}

async fn read_image(field: Field<'_>) -> Result<ImageUpload> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_ascii_lowercase();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok(ImageUpload {
        bytes,
        content_type,
    })
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}

// ─── Saved Recipes ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveRecipeBody {
    #[serde(rename = "recipeId", default)]
    recipe_id: String,
}

/// Saved list as recipe ids, in save order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedIdsResponse {
    pub saved_recipes: Vec<String>,
}

/// Saved list with recipes resolved, in save order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipesResponse {
    pub saved_recipes: Vec<RecipeView>,
}

async fn save_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<SaveRecipeBody>, JsonRejection>,
) -> Result<Json<SavedIdsResponse>> {
    let Json(body) = body?;
    let recipe_id = body.recipe_id.trim();
    if recipe_id.is_empty() {
        return Err(AppError::Validation("recipeId is required".to_string()));
    }

    let saved_recipes = state
        .recipe_service
        .save_recipe(&user.user_id, recipe_id)
        .await?;
    Ok(Json(SavedIdsResponse { saved_recipes }))
}

async fn list_saved(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SavedRecipesResponse>> {
    let saved_recipes = state.recipe_service.list_saved(&user.user_id).await?;
    Ok(Json(SavedRecipesResponse { saved_recipes }))
}

async fn unsave_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<Json<SavedIdsResponse>> {
    let saved_recipes = state
        .recipe_service
        .unsave_recipe(&user.user_id, &recipe_id)
        .await?;
    Ok(Json(SavedIdsResponse { saved_recipes }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredients_single_line() {
        assert_eq!(parse_ingredients("2 eggs"), vec!["2 eggs"]);
    }

    #[test]
    fn test_parse_ingredients_json_array() {
        assert_eq!(
            parse_ingredients(r#"["2 eggs", "1 cup flour"]"#),
            vec!["2 eggs", "1 cup flour"]
        );
    }

    #[test]
    fn test_parse_ingredients_bracket_text_kept_as_line() {
        assert_eq!(parse_ingredients("[optional] chives"), vec!["[optional] chives"]);
    }

    #[test]
    fn test_form_requires_numeric_cooking_time() {
        let form = RecipeForm {
            cooking_time: Some("soon".to_string()),
            ..RecipeForm::default()
        };
        assert!(matches!(form.into_parts(), Err(AppError::Validation(_))));

        let missing = RecipeForm::default();
        assert!(matches!(missing.into_parts(), Err(AppError::Validation(_))));
    }
}
