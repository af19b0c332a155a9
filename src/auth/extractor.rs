// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, AuthenticatedUser, Role};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Validates the JWT from the Authorization header and provides the
/// authenticated user information.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A previous layer may already have authenticated the request
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(&parts.headers)?;
        let claims = state.auth.keys.verify(token)?;

        Ok(Auth(AuthenticatedUser::from_claims(claims)))
    }
}

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Extractor that requires issuer privileges (issuer role, or admin).
pub struct IssuerOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for IssuerOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.has_role(Role::Issuer) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(IssuerOnly(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use tempfile::TempDir;

    use crate::state::{AppState, AuthContext};
    use crate::storage::{FileStorage, StoragePaths};

    fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = FileStorage::new(StoragePaths::new(temp_dir.path()));
        storage.initialize().expect("Failed to initialize storage");

        let state = AppState::new(storage, AuthContext::new("test-secret"));
        (state, temp_dir)
    }

    fn request_with_token(token: &str) -> Parts {
        Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_valid_jwt() {
        let (state, _temp_dir) = create_test_state();
        let token = state
            .auth
            .keys
            .issue("user_123", "owner@example.com", Role::Owner)
            .unwrap();
        let mut parts = request_with_token(&token);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        let Auth(user) = result.expect("valid token authenticates");
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Owner);
    }

    #[tokio::test]
    async fn auth_extractor_rejects_forged_jwt() {
        let (state, _temp_dir) = create_test_state();
        let forged = crate::auth::JwtKeys::new("attacker-secret")
            .issue("user_123", "owner@example.com", Role::Admin)
            .unwrap();
        let mut parts = request_with_token(&forged);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let user = AuthenticatedUser {
            user_id: "user_from_layer".to_string(),
            email: "layer@example.com".to_string(),
            role: Role::Admin,
            expires_at: 0,
        };
        parts.extensions.insert(user);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.user_id, "user_from_layer");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _temp_dir) = create_test_state();
        let token = state
            .auth
            .keys
            .issue("user_123", "owner@example.com", Role::Owner)
            .unwrap();
        let mut parts = request_with_token(&token);

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn issuer_only_accepts_issuer_and_admin() {
        let (state, _temp_dir) = create_test_state();

        for (role, ok) in [(Role::Issuer, true), (Role::Admin, true), (Role::Owner, false)] {
            let token = state.auth.keys.issue("u", "u@example.com", role).unwrap();
            let mut parts = request_with_token(&token);
            let result = IssuerOnly::from_request_parts(&mut parts, &state).await;
            assert_eq!(result.is_ok(), ok, "role {role} acceptance");
        }
    }
}
