// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::env;

use axum::{
    http::{HeaderMap, HeaderValue},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use url::Url;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::FRONTEND_URL_ENV, state::AppState};

pub mod admin;
pub mod auth;
pub mod documents;
pub mod health;
pub mod users;
pub mod verifications;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/verify-token", post(auth::verify_token))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/users/me",
            get(users::get_current_user).put(users::update_current_user),
        )
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/{document_id}",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route(
            "/documents/{document_id}/revoke",
            post(documents::revoke_document),
        )
        .route(
            "/verify/documents/{document_id}",
            get(verifications::check_document),
        )
        .route(
            "/verify/requests",
            get(verifications::list_requests).post(verifications::create_request),
        )
        .route(
            "/verify/requests/{request_id}/approve",
            post(verifications::approve_request),
        )
        .route(
            "/verify/requests/{request_id}/deny",
            post(verifications::deny_request),
        )
        .route("/verify/access/{token}", get(verifications::redeem_access))
        .route("/admin/stats", get(admin::get_system_stats))
        .route("/admin/users", get(admin::list_all_users))
        .route("/admin/users/{user_id}", delete(admin::delete_user))
        .route(
            "/admin/documents/{document_id}/revoke",
            post(admin::revoke_any_document),
        )
        .route("/admin/audit/events", get(admin::query_audit_logs))
        .route("/admin/health", get(admin::get_detailed_health))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// CORS restricted to `FRONTEND_URL` when configured, permissive otherwise.
fn cors_layer() -> CorsLayer {
    let configured = env::var(FRONTEND_URL_ENV)
        .ok()
        .and_then(|raw| Url::parse(&raw).ok())
        .and_then(|url| {
            url.origin()
                .ascii_serialization()
                .parse::<HeaderValue>()
                .ok()
        });

    match configured {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

/// Client metadata for audit events, taken from proxy headers.
pub(crate) fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    (ip, user_agent)
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        auth::signup,
        auth::signin,
        auth::verify_token,
        auth::refresh,
        auth::logout,
        users::get_current_user,
        users::update_current_user,
        documents::create_document,
        documents::list_documents,
        documents::get_document,
        documents::update_document,
        documents::delete_document,
        documents::revoke_document,
        verifications::check_document,
        verifications::create_request,
        verifications::list_requests,
        verifications::approve_request,
        verifications::deny_request,
        verifications::redeem_access,
        admin::get_system_stats,
        admin::list_all_users,
        admin::delete_user,
        admin::revoke_any_document,
        admin::query_audit_logs,
        admin::get_detailed_health,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            crate::auth::Role,
            crate::auth::AuthenticatedUser,
            crate::storage::UserResponse,
            crate::storage::StoredDocument,
            crate::storage::DocumentStatus,
            crate::storage::StoredVerificationRequest,
            crate::storage::VerificationStatus,
            crate::storage::StoredRevocation,
            crate::storage::AuditAction,
            crate::storage::AuditEvent,
            auth::SignupRequest,
            auth::SigninRequest,
            auth::AuthResponse,
            auth::VerifyTokenResponse,
            auth::TokenResponse,
            auth::MessageResponse,
            users::UpdateProfileRequest,
            documents::CreateDocumentRequest,
            documents::UpdateDocumentRequest,
            documents::RevokeDocumentRequest,
            documents::DocumentListResponse,
            verifications::CreateVerificationRequestBody,
            verifications::VerificationListResponse,
            verifications::ApproveResponse,
            verifications::DocumentCheckResponse,
            verifications::AccessResponse,
            admin::SystemStatsResponse,
            admin::AdminUserSummary,
            admin::AdminUserListResponse,
            admin::AuditLogResponse,
            admin::DetailedHealthResponse,
            admin::StorageHealth,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Account registration and session tokens"),
        (name = "Users", description = "Profile management"),
        (name = "Documents", description = "Credential issuance and revocation"),
        (name = "Verification", description = "Verification requests and access tokens"),
        (name = "Admin", description = "Aggregate statistics, audit queries, and overrides"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
