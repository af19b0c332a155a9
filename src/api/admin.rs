// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints for system management.
//!
//! These endpoints require the Admin role and provide:
//! - System statistics
//! - User overview with resource counts
//! - User deletion (cascades to the user's documents)
//! - Document revocation override
//! - Audit log queries
//! - Detailed health

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    state::AppState,
    storage::{
        AuditAction, AuditEvent, AuditRepository, DocumentRepository, DocumentStatus,
        RevocationRepository, StoredDocument, UserRepository, VerificationRepository,
        VerificationStatus,
    },
};

use super::documents::{perform_revocation, RevokeDocumentRequest};

// ============================================================================
// Request/Response Types
// ============================================================================

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatsResponse {
    /// Total number of accounts.
    pub total_users: usize,
    /// Total number of documents.
    pub total_documents: usize,
    /// Number of active documents.
    pub active_documents: usize,
    /// Number of revoked documents.
    pub revoked_documents: usize,
    /// Number of expired documents.
    pub expired_documents: usize,
    /// Total number of verification requests.
    pub total_verification_requests: usize,
    /// Number of pending verification requests.
    pub pending_verification_requests: usize,
    /// Number of approved verification requests.
    pub approved_verification_requests: usize,
    /// Number of denied verification requests.
    pub denied_verification_requests: usize,
    /// Total number of revocation records.
    pub total_revocations: usize,
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// Current timestamp.
    pub timestamp: String,
}

/// Admin user summary with resource counts.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserSummary {
    /// User ID.
    pub user_id: String,
    /// Email address.
    pub email: String,
    /// Account role.
    pub role: crate::auth::Role,
    /// Organization name, if set.
    pub organization_name: Option<String>,
    /// Documents issued by this user.
    pub issued_document_count: usize,
    /// Documents held by this user.
    pub held_document_count: usize,
    /// Verification requests decided by this user.
    pub verification_request_count: usize,
}

/// Response for the admin user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserListResponse {
    /// User summaries.
    pub users: Vec<AdminUserSummary>,
    /// Total unique users.
    pub total: usize,
}

/// Query parameters for audit log queries.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQueryParams {
    /// Start date (YYYY-MM-DD format).
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD format).
    pub end_date: Option<String>,
    /// Filter by acting user ID.
    pub actor_id: Option<String>,
    /// Filter by action (wire name, e.g. `document_revoked`).
    pub action: Option<String>,
    /// Filter by resource type.
    pub resource_type: Option<String>,
    /// Filter by resource ID.
    pub resource_id: Option<String>,
    /// Maximum number of results (default 100, max 1000).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

/// Response for audit log queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Audit events matching the query.
    pub events: Vec<AuditEvent>,
    /// Total count (before limit/offset).
    pub total: usize,
    /// Whether there are more results.
    pub has_more: bool,
}

/// Detailed health check response for admins.
#[derive(Debug, Serialize, ToSchema)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Storage health.
    pub storage: StorageHealth,
    /// Server version.
    pub version: String,
}

/// Storage health details.
#[derive(Debug, Serialize, ToSchema)]
pub struct StorageHealth {
    /// Data directory path.
    pub data_dir: String,
    /// Whether the data directory exists.
    pub exists: bool,
    /// Whether the data directory is writable.
    pub writable: bool,
    /// Total files in storage (approximate).
    pub total_files: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get system statistics.
///
/// Returns aggregate statistics about accounts, documents, verification
/// requests, and revocations. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "System statistics", body = SystemStatsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_system_stats(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let storage = state.storage();

    let total_users = UserRepository::new(storage).list_all().unwrap_or_default().len();

    let documents = DocumentRepository::new(storage).list_all().unwrap_or_default();
    let active_documents = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Active)
        .count();
    let revoked_documents = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Revoked)
        .count();
    let expired_documents = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Expired)
        .count();

    let requests = VerificationRepository::new(storage)
        .list_all()
        .unwrap_or_default();
    let pending = requests
        .iter()
        .filter(|r| r.status == VerificationStatus::Pending)
        .count();
    let approved = requests
        .iter()
        .filter(|r| r.status == VerificationStatus::Approved)
        .count();
    let denied = requests
        .iter()
        .filter(|r| r.status == VerificationStatus::Denied)
        .count();

    let total_revocations = RevocationRepository::new(storage)
        .list_all()
        .unwrap_or_default()
        .len();

    crate::audit_log!(storage, AuditAction::AdminAccess, &user);

    Ok(Json(SystemStatsResponse {
        total_users,
        total_documents: documents.len(),
        active_documents,
        revoked_documents,
        expired_documents,
        total_verification_requests: requests.len(),
        pending_verification_requests: pending,
        approved_verification_requests: approved,
        denied_verification_requests: denied,
        total_revocations,
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// List all users with their resource counts.
#[utoipa::path(
    get,
    path = "/v1/admin/users",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User summaries", body = AdminUserListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_all_users(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<AdminUserListResponse>, ApiError> {
    let storage = state.storage();

    let accounts = UserRepository::new(storage).list_all().unwrap_or_default();
    let documents = DocumentRepository::new(storage).list_all().unwrap_or_default();
    let requests = VerificationRepository::new(storage)
        .list_all()
        .unwrap_or_default();

    let users: Vec<AdminUserSummary> = accounts
        .into_iter()
        .map(|account| {
            let issued = documents.iter().filter(|d| d.issuer_id == account.id).count();
            let held = documents.iter().filter(|d| d.owner_id == account.id).count();
            let decided = requests.iter().filter(|r| r.owner_id == account.id).count();
            AdminUserSummary {
                user_id: account.id,
                email: account.email,
                role: account.role,
                organization_name: account.organization_name,
                issued_document_count: issued,
                held_document_count: held,
                verification_request_count: decided,
            }
        })
        .collect();
    let total = users.len();

    crate::audit_log!(storage, AuditAction::AdminAccess, &user);

    Ok(Json(AdminUserListResponse { users, total }))
}

/// Delete a user and all their documents.
///
/// Removes the profile, every document the user issued or holds, and the
/// user's verification requests. Revocation and audit records are retained.
#[utoipa::path(
    delete,
    path = "/v1/admin/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "User to delete")
    ),
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Admins cannot delete themselves")
    )
)]
pub async fn delete_user(
    AdminOnly(admin): AdminOnly,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if user_id == admin.user_id {
        return Err(ApiError::unprocessable("Admins cannot delete themselves"));
    }

    let storage = state.storage();
    let users = UserRepository::new(storage);
    users
        .delete(&user_id)
        .map_err(|_| ApiError::not_found("User not found"))?;

    // Cascade: documents issued to or held by the user
    let documents = DocumentRepository::new(storage);
    let mut removed_documents = 0usize;
    for document in documents.list_all().unwrap_or_default() {
        if document.issuer_id == user_id || document.owner_id == user_id {
            if documents.delete(&document.id).is_ok() {
                removed_documents += 1;
            }
        }
    }

    // Cascade: the user's verification inbox
    let verifications = VerificationRepository::new(storage);
    for request in verifications.list_by_owner(&user_id, None).unwrap_or_default() {
        let _ = verifications.delete(&request.id);
    }

    let event = AuditEvent::new(AuditAction::UserDeleted)
        .with_actor(&admin.user_id)
        .with_resource("user", &user_id)
        .with_details(serde_json::json!({ "removed_documents": removed_documents }));
    let _ = AuditRepository::new(storage).log(&event);

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke any document (admin override).
#[utoipa::path(
    post,
    path = "/v1/admin/documents/{document_id}/revoke",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    request_body = RevokeDocumentRequest,
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document revoked", body = StoredDocument),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "Document not found"),
        (status = 422, description = "Already revoked")
    )
)]
pub async fn revoke_any_document(
    AdminOnly(admin): AdminOnly,
    Path(document_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RevokeDocumentRequest>,
) -> Result<Json<StoredDocument>, ApiError> {
    let document = perform_revocation(state.storage(), &document_id, &admin, request.reason)?;
    Ok(Json(document))
}

/// Query audit logs.
///
/// Search and filter audit log entries. Supports date range, actor,
/// action, and resource filtering. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/audit/events",
    tag = "Admin",
    params(AuditQueryParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Audit events", body = AuditLogResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn query_audit_logs(
    AdminOnly(admin): AdminOnly,
    Query(params): Query<AuditQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let storage = state.storage();
    let audit_repo = AuditRepository::new(storage);

    // Default date range: today only
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let start_date = params.start_date.as_deref().unwrap_or(&today);
    let end_date = params.end_date.as_deref().unwrap_or(&today);

    NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("Invalid start_date format. Use YYYY-MM-DD."))?;
    NaiveDate::parse_from_str(end_date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("Invalid end_date format. Use YYYY-MM-DD."))?;

    let mut events = audit_repo
        .read_events_range(start_date, end_date)
        .unwrap_or_default();

    if let Some(actor_id) = &params.actor_id {
        events.retain(|e| e.actor_id.as_deref() == Some(actor_id.as_str()));
    }

    if let Some(action) = &params.action {
        events.retain(|e| e.action.as_str() == action);
    }

    if let Some(resource_type) = &params.resource_type {
        events.retain(|e| e.resource_type.as_deref() == Some(resource_type.as_str()));
    }

    if let Some(resource_id) = &params.resource_id {
        events.retain(|e| e.resource_id.as_deref() == Some(resource_id.as_str()));
    }

    // Newest first, matching the admin dashboard
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total = events.len();
    let limit = params.limit.unwrap_or(100).min(1000);
    let offset = params.offset.unwrap_or(0);

    let has_more = offset + limit < total;
    let events: Vec<AuditEvent> = events.into_iter().skip(offset).take(limit).collect();

    crate::audit_log!(storage, AuditAction::AdminAccess, &admin);

    Ok(Json(AuditLogResponse {
        events,
        total,
        has_more,
    }))
}

/// Get detailed health information.
///
/// Returns comprehensive health status including storage metrics.
/// More detailed than the public health endpoint. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/health",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Detailed health status", body = DetailedHealthResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_detailed_health(
    AdminOnly(_user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<DetailedHealthResponse>, ApiError> {
    let storage = state.storage();
    let data_dir = storage.paths().root().to_string_lossy().to_string();

    let exists = storage.paths().root().exists();
    let writable = storage.health_check().is_ok();
    let total_files = count_files_recursive(storage.paths().root());

    Ok(Json(DetailedHealthResponse {
        status: if exists && writable { "healthy" } else { "degraded" }.to_string(),
        storage: StorageHealth {
            data_dir,
            exists,
            writable,
            total_files,
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Count files recursively in a directory.
fn count_files_recursive(path: &std::path::Path) -> usize {
    if !path.exists() {
        return 0;
    }

    let mut count = 0;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_file() {
                count += 1;
            } else if entry_path.is_dir() {
                count += count_files_recursive(&entry_path);
            }
        }
    }
    count
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::state::AuthContext;
    use crate::storage::{
        normalize_email, FileStorage, StoragePaths, StoredUser, StoredVerificationRequest,
    };
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (AppState::new(storage, AuthContext::new("test-secret")), temp)
    }

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "admin-1".to_string(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            expires_at: 0,
        }
    }

    fn seed_user(state: &AppState, id: &str, role: Role) {
        UserRepository::new(&state.storage)
            .create(&StoredUser {
                id: id.to_string(),
                email: normalize_email(&format!("{id}@example.com")),
                password_hash: "$2b$10$fake".to_string(),
                role,
                organization_name: None,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    fn seed_document(state: &AppState, id: &str, issuer: &str, owner: &str) {
        let now = Utc::now();
        DocumentRepository::new(&state.storage)
            .create(&StoredDocument {
                id: id.to_string(),
                issuer_id: issuer.to_string(),
                owner_id: owner.to_string(),
                title: "Title".to_string(),
                document_type: "diploma".to_string(),
                document_hash: "ab".repeat(32),
                status: DocumentStatus::Active,
                issuance_date: now,
                expiry_date: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    fn seed_request(state: &AppState, id: &str, owner: &str, status: VerificationStatus) {
        VerificationRepository::new(&state.storage)
            .create(&StoredVerificationRequest {
                id: id.to_string(),
                document_id: "d-1".to_string(),
                owner_id: owner.to_string(),
                verifier_email: "hr@acme.example".to_string(),
                purpose: "Screening".to_string(),
                status,
                token_created_at: None,
                token_expires_at: None,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let (state, _temp) = test_state();
        seed_user(&state, "issuer-1", Role::Issuer);
        seed_user(&state, "owner-1", Role::Owner);
        seed_document(&state, "d-1", "issuer-1", "owner-1");
        seed_document(&state, "d-2", "issuer-1", "owner-1");
        seed_request(&state, "vr-1", "owner-1", VerificationStatus::Pending);
        seed_request(&state, "vr-2", "owner-1", VerificationStatus::Approved);

        let Json(stats) = get_system_stats(AdminOnly(admin()), State(state))
            .await
            .unwrap();

        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.active_documents, 2);
        assert_eq!(stats.total_verification_requests, 2);
        assert_eq!(stats.pending_verification_requests, 1);
        assert_eq!(stats.approved_verification_requests, 1);
        assert_eq!(stats.total_revocations, 0);
    }

    #[tokio::test]
    async fn user_list_carries_resource_counts() {
        let (state, _temp) = test_state();
        seed_user(&state, "issuer-1", Role::Issuer);
        seed_user(&state, "owner-1", Role::Owner);
        seed_document(&state, "d-1", "issuer-1", "owner-1");
        seed_request(&state, "vr-1", "owner-1", VerificationStatus::Pending);

        let Json(response) = list_all_users(AdminOnly(admin()), State(state))
            .await
            .unwrap();
        assert_eq!(response.total, 2);

        let issuer = response
            .users
            .iter()
            .find(|u| u.user_id == "issuer-1")
            .unwrap();
        assert_eq!(issuer.issued_document_count, 1);
        assert_eq!(issuer.held_document_count, 0);

        let owner = response
            .users
            .iter()
            .find(|u| u.user_id == "owner-1")
            .unwrap();
        assert_eq!(owner.held_document_count, 1);
        assert_eq!(owner.verification_request_count, 1);
    }

    #[tokio::test]
    async fn delete_user_cascades_documents_and_requests() {
        let (state, _temp) = test_state();
        seed_user(&state, "owner-1", Role::Owner);
        seed_document(&state, "d-1", "issuer-1", "owner-1");
        seed_document(&state, "d-2", "issuer-2", "owner-2");
        seed_request(&state, "vr-1", "owner-1", VerificationStatus::Pending);

        let status = delete_user(
            AdminOnly(admin()),
            Path("owner-1".to_string()),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert!(!UserRepository::new(&state.storage).exists("owner-1"));
        assert!(!DocumentRepository::new(&state.storage).exists("d-1"));
        // Unrelated document survives
        assert!(DocumentRepository::new(&state.storage).exists("d-2"));
        assert!(!VerificationRepository::new(&state.storage).exists("vr-1"));
    }

    #[tokio::test]
    async fn delete_user_refuses_self_and_unknown() {
        let (state, _temp) = test_state();

        let err = delete_user(
            AdminOnly(admin()),
            Path("admin-1".to_string()),
            State(state.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err = delete_user(AdminOnly(admin()), Path("ghost".to_string()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn audit_query_filters_and_paginates() {
        let (state, _temp) = test_state();
        let repo = AuditRepository::new(&state.storage);
        for i in 0..5 {
            repo.log(
                &AuditEvent::new(AuditAction::DocumentIssued)
                    .with_actor("issuer-1")
                    .with_resource("document", format!("d-{i}")),
            )
            .unwrap();
        }
        repo.log(&AuditEvent::new(AuditAction::Signin).with_actor("owner-1"))
            .unwrap();

        let Json(response) = query_audit_logs(
            AdminOnly(admin()),
            Query(AuditQueryParams {
                start_date: None,
                end_date: None,
                actor_id: Some("issuer-1".to_string()),
                action: Some("document_issued".to_string()),
                resource_type: None,
                resource_id: None,
                limit: Some(2),
                offset: Some(0),
            }),
            State(state.clone()),
        )
        .await
        .unwrap();

        assert_eq!(response.total, 5);
        assert_eq!(response.events.len(), 2);
        assert!(response.has_more);

        let err = query_audit_logs(
            AdminOnly(admin()),
            Query(AuditQueryParams {
                start_date: Some("yesterday".to_string()),
                end_date: None,
                actor_id: None,
                action: None,
                resource_type: None,
                resource_id: None,
                limit: None,
                offset: None,
            }),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn detailed_health_reports_storage() {
        let (state, _temp) = test_state();

        let Json(health) = get_detailed_health(AdminOnly(admin()), State(state))
            .await
            .unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.storage.exists);
        assert!(health.storage.writable);
    }

    #[test]
    fn count_files_handles_missing_dir() {
        let path = std::path::Path::new("/nonexistent/path");
        assert_eq!(count_files_recursive(path), 0);
    }
}
