// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google_oauth;
pub mod google_oidc;
pub mod identity;
pub mod recipes;

pub use google_oauth::GoogleOAuthClient;
pub use google_oidc::{GoogleIdTokenVerifier, GoogleIdentity, OidcError};
pub use identity::{IdentityBroker, IdentityProvider, LoginOutcome, ProviderIdentity};
pub use recipes::{ImageUpload, RecipeService};
