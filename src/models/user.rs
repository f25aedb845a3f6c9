// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User record stored in the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Local user ID (also used as document ID)
    pub id: String,
    /// Google account subject (unique)
    pub google_id: String,
    /// Display name from the Google profile
    pub display_name: String,
    /// Email address (unique)
    pub email: String,
    /// Avatar URL
    pub photo_url: Option<String>,
    /// Saved recipe IDs, in the order they were saved
    #[serde(default)]
    pub saved_recipes: Vec<String>,
    /// When the user first signed in
    pub created_at: String,
}

/// Current user as returned by `GET /auth/user`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub saved_recipes: Vec<String>,
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            email: user.email,
            photo_url: user.photo_url,
            saved_recipes: user.saved_recipes,
            created_at: user.created_at,
        }
    }
}
