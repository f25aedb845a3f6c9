// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and saved-recipe list)
//! - Recipes
//!
//! Session documents are handled by `sessions::FirestoreSessionStore`,
//! which shares this client.

use crate::db::{add_to_saved, collections, remove_from_saved, RecipeStore, UserStore};
use crate::error::AppError;
use crate::models::{Recipe, User};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator does not check credentials
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Get the client or return an error if offline.
    pub(crate) fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn set_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read-modify-write of one user's saved list, committed through a
    /// transaction so the list is written back whole.
    async fn update_saved_recipes<F>(
        &self,
        user_id: &str,
        recipe_id: &str,
        apply: F,
    ) -> Result<Vec<String>, AppError>
    where
        F: FnOnce(&mut Vec<String>, &str) -> bool + Send,
    {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Read through the transaction so a concurrent write aborts the commit
        let tx_client = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let current: Option<User> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read user in transaction: {}", e)))?;

        let Some(mut user) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        };

        if !apply(&mut user.saved_recipes, recipe_id) {
            // Already in the requested state; nothing to write
            let _ = transaction.rollback().await;
            return Ok(user.saved_recipes);
        }

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(user.saved_recipes)
    }

    /// Fetch documents by ID, keeping the requested order and skipping misses.
    async fn get_many<T>(&self, collection: &'static str, ids: &[String]) -> Result<Vec<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send + 'static,
    {
        let client = self.get_client()?;

        let found = stream::iter(ids.to_vec())
            .map(|id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collection)
                    .obj::<T>()
                    .one(&id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<T>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<T>>, AppError>>()?;

        Ok(found.into_iter().flatten().collect())
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserStore for FirestoreDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError> {
        self.get_many(collections::USERS, user_ids).await
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let google_id = google_id.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("google_id").eq(google_id.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_user(user).await
    }

    async fn add_saved_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Vec<String>, AppError> {
        self.update_saved_recipes(user_id, recipe_id, add_to_saved)
            .await
    }

    async fn remove_saved_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Vec<String>, AppError> {
        self.update_saved_recipes(user_id, recipe_id, remove_from_saved)
            .await
    }
}

// ─── Recipe Operations ───────────────────────────────────────

#[async_trait]
impl RecipeStore for FirestoreDb {
    async fn get_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECIPES)
            .obj()
            .one(recipe_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_recipes(&self, recipe_ids: &[String]) -> Result<Vec<Recipe>, AppError> {
        self.get_many(collections::RECIPES, recipe_ids).await
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RECIPES)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::RECIPES)
            .document_id(&recipe.id)
            .object(recipe)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
