// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod recipe;
pub mod user;

pub use recipe::{NewRecipe, OwnerSummary, Recipe, RecipeView};
pub use user::{User, UserProfile};
