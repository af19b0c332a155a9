// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication endpoints: signup, signin, token verification, refresh,
//! and logout.
//!
//! Signin failures are deliberately indistinguishable (unknown email vs.
//! wrong password) and both paths leave a failed `signin` audit event.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{bearer_token, password, Auth, AuthenticatedUser, Role},
    error::ApiError,
    state::AppState,
    storage::{
        normalize_email, AuditAction, AuditEvent, AuditRepository, StoredUser, UserRepository,
        UserResponse,
    },
};

use super::client_meta;

/// Request body for POST /v1/auth/signup.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    /// Email address (stored normalized)
    pub email: String,
    /// Plaintext password, at least 8 characters
    pub password: String,
    /// Account role: issuer, owner, or admin
    pub role: Role,
    /// Organization name (issuers typically set this)
    #[serde(default)]
    pub organization_name: Option<String>,
}

/// Request body for POST /v1/auth/signin.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Response for signup and signin.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

/// Response for POST /v1/auth/verify-token.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthenticatedUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for POST /v1/auth/refresh.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Plain message response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Shallow email shape check; real validation is the signin round trip.
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if request.password.chars().count() < password::MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let users = UserRepository::new(&state.storage);
    if users.find_by_email(&email)?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let password_hash = password::hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;

    let user = StoredUser {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        role: request.role,
        organization_name: request.organization_name,
        created_at: Utc::now(),
    };
    users.create(&user)?;

    let token = state
        .auth
        .keys
        .issue(&user.id, &user.email, user.role)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    let (ip, user_agent) = client_meta(&headers);
    let event = AuditEvent::new(AuditAction::Signup)
        .with_actor(&user.id)
        .with_resource("user", &user.id)
        .with_client(ip, user_agent);
    let _ = AuditRepository::new(&state.storage).log(&event);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/v1/auth/signin",
    request_body = SigninRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SigninRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&request.email);
    let users = UserRepository::new(&state.storage);
    let (ip, user_agent) = client_meta(&headers);

    let user = match users.find_by_email(&email)? {
        Some(user) if password::verify_password(&request.password, &user.password_hash) => user,
        found => {
            let event = AuditEvent::new(AuditAction::Signin)
                .with_client(ip, user_agent)
                .with_details(serde_json::json!({ "email": email }))
                .failed("Invalid credentials");
            let event = match found {
                Some(user) => event.with_actor(&user.id),
                None => event,
            };
            let _ = AuditRepository::new(&state.storage).log(&event);
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    let token = state
        .auth
        .keys
        .issue(&user.id, &user.email, user.role)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    let event = AuditEvent::new(AuditAction::Signin)
        .with_actor(&user.id)
        .with_resource("user", &user.id)
        .with_client(ip, user_agent)
        .with_details(serde_json::json!({ "email": user.email }));
    let _ = AuditRepository::new(&state.storage).log(&event);

    Ok(Json(AuthResponse {
        message: "Signed in successfully".to_string(),
        user: user.into(),
        token,
    }))
}

/// Verify a session token.
///
/// Returns 200 with the token's identity when valid, 401 with
/// `{"valid": false}` otherwise.
#[utoipa::path(
    post,
    path = "/v1/auth/verify-token",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 401, description = "Token is missing or invalid", body = VerifyTokenResponse)
    )
)]
pub async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<VerifyTokenResponse>) {
    let verified = bearer_token(&headers)
        .and_then(|token| state.auth.keys.verify(token));

    match verified {
        Ok(claims) => (
            StatusCode::OK,
            Json(VerifyTokenResponse {
                valid: true,
                user: Some(AuthenticatedUser::from_claims(claims)),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyTokenResponse {
                valid: false,
                user: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

/// Re-issue a fresh 24 h token for a valid session.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fresh token", body = TokenResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn refresh(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .auth
        .keys
        .issue(&user.user_id, &user.email, user.role)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(TokenResponse { token }))
}

/// Log out.
///
/// Tokens are stateless; logout only records the audit event.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    Auth(user): Auth,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<MessageResponse> {
    let (ip, user_agent) = client_meta(&headers);
    let event = AuditEvent::new(AuditAction::Logout)
        .with_actor(&user.user_id)
        .with_resource("user", &user.user_id)
        .with_client(ip, user_agent);
    let _ = AuditRepository::new(&state.storage).log(&event);

    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}
