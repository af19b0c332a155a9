// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::Auth,
    error::ApiError,
    state::AppState,
    storage::{UserRepository, UserResponse},
};

/// Request body for PUT /v1/users/me.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// New organization name; `null` clears it
    pub organization_name: Option<String>,
}

/// Get the current authenticated user's profile.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn get_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let stored = UserRepository::new(&state.storage)
        .get(&user.user_id)
        .map_err(|_| ApiError::not_found("Account not found"))?;

    Ok(Json(stored.into()))
}

/// Update the current user's profile.
#[utoipa::path(
    put,
    path = "/v1/users/me",
    request_body = UpdateProfileRequest,
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn update_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let mut stored = repo
        .get(&user.user_id)
        .map_err(|_| ApiError::not_found("Account not found"))?;

    stored.organization_name = request.organization_name;
    repo.update(&stored)?;

    Ok(Json(stored.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::state::AuthContext;
    use crate::storage::{normalize_email, FileStorage, StoragePaths, StoredUser};
    use chrono::Utc;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (AppState::new(storage, AuthContext::new("test-secret")), temp)
    }

    fn seed_user(state: &AppState, id: &str) {
        UserRepository::new(&state.storage)
            .create(&StoredUser {
                id: id.to_string(),
                email: normalize_email(&format!("{id}@example.com")),
                password_hash: "$2b$10$fake".to_string(),
                role: Role::Issuer,
                organization_name: Some("Acme University".to_string()),
                created_at: Utc::now(),
            })
            .unwrap();
    }

    fn auth_user(id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: id.to_string(),
            email: format!("{id}@example.com"),
            role: Role::Issuer,
            expires_at: 0,
        }
    }

    #[tokio::test]
    async fn me_returns_stored_profile() {
        let (state, _temp) = test_state();
        seed_user(&state, "u-1");

        let Json(profile) = get_current_user(Auth(auth_user("u-1")), State(state))
            .await
            .unwrap();
        assert_eq!(profile.id, "u-1");
        assert_eq!(profile.organization_name, Some("Acme University".to_string()));
    }

    #[tokio::test]
    async fn me_404s_for_deleted_account() {
        let (state, _temp) = test_state();

        let err = get_current_user(Auth(auth_user("ghost")), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_replaces_organization_name() {
        let (state, _temp) = test_state();
        seed_user(&state, "u-1");

        let Json(profile) = update_current_user(
            Auth(auth_user("u-1")),
            State(state.clone()),
            Json(UpdateProfileRequest {
                organization_name: Some("Globex".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(profile.organization_name, Some("Globex".to_string()));

        let Json(profile) = update_current_user(
            Auth(auth_user("u-1")),
            State(state),
            Json(UpdateProfileRequest {
                organization_name: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(profile.organization_name, None);
    }
}
