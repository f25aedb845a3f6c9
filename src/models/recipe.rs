// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recipe model for storage and API.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::User;

/// Stored recipe record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe ID (also used as document ID)
    pub id: String,
    pub name: String,
    pub description: String,
    /// Ingredient lines, never empty
    pub ingredients: Vec<String>,
    pub instruction: String,
    /// Public URL of the stored image
    pub image_url: String,
    /// Cooking time in minutes
    pub cooking_time: u32,
    /// ID of the creating user, fixed at creation
    pub user_owner: String,
    /// Creation timestamp (RFC 3339, millisecond precision, UTC)
    pub created_at: String,
}

/// Fields submitted to create a recipe, after normalization.
#[derive(Debug, Clone, Validate)]
pub struct NewRecipe {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "name is too long")
    )]
    pub name: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 2000, message = "description is too long")
    )]
    pub description: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "at least one ingredient is required (at most 100)"
    ))]
    pub ingredients: Vec<String>,
    #[validate(
        custom(function = "not_blank"),
        length(max = 10000, message = "instruction is too long")
    )]
    pub instruction: String,
    /// Minutes, at most one week
    #[validate(range(
        min = 1,
        max = 10080,
        message = "cooking time must be a positive number of minutes"
    ))]
    pub cooking_time: i64,
}

impl NewRecipe {
    /// Trim text fields and drop blank ingredient lines.
    pub fn new(
        name: &str,
        description: &str,
        ingredients: Vec<String>,
        instruction: &str,
        cooking_time: i64,
    ) -> Self {
        Self {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            ingredients: ingredients
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            instruction: instruction.trim().to_string(),
            cooking_time,
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("field is required".into());
        return Err(err);
    }
    Ok(())
}

/// Owner fields joined onto a recipe at read time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
        }
    }
}

/// Recipe as returned by the API, with its owner resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instruction: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub cooking_time: u32,
    pub created_at: String,
    /// `None` when the owning user no longer exists
    pub user_owner: Option<OwnerSummary>,
}

impl RecipeView {
    pub fn new(recipe: Recipe, owner: Option<OwnerSummary>) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            description: recipe.description,
            ingredients: recipe.ingredients,
            instruction: recipe.instruction,
            image_url: recipe.image_url,
            cooking_time: recipe.cooking_time,
            created_at: recipe.created_at,
            user_owner: owner,
        }
    }
}
