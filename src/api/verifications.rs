// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification endpoints.
//!
//! Verifiers are not a login role: checking a document, filing a request,
//! and redeeming an access token are public. Owners decide their requests;
//! the only legal transitions are `pending -> approved` and
//! `pending -> denied`. Approval mints an HMAC access token bound to
//! `token_expires_at`; expiry is enforced at redemption.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::{Auth, Role},
    error::ApiError,
    state::AppState,
    storage::{
        AuditAction, AuditEvent, AuditRepository, DocumentRepository, DocumentStatus,
        OwnershipEnforcer, RevocationRepository, StoredDocument, StoredVerificationRequest,
        VerificationRepository, VerificationStatus,
    },
    tokens::AccessToken,
};

use super::client_meta;

/// Access token lifetime after approval.
const ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Request body for POST /v1/verify/requests.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVerificationRequestBody {
    /// Document the verifier wants to see
    pub document_id: String,
    /// Verifier's email address
    pub verifier_email: String,
    /// Stated purpose of the verification
    pub purpose: String,
}

/// Query parameters for GET /v1/verify/requests.
#[derive(Debug, Deserialize, IntoParams)]
pub struct VerificationQuery {
    /// Filter by owner (admins only; owners are pinned to themselves)
    pub owner_id: Option<String>,
    /// Filter by status
    pub status: Option<VerificationStatus>,
}

/// Response for request listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationListResponse {
    pub requests: Vec<StoredVerificationRequest>,
    pub total: usize,
}

/// Response for an approval.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApproveResponse {
    pub request: StoredVerificationRequest,
    /// Opaque token the verifier redeems at GET /v1/verify/access/{token}
    pub access_token: String,
}

/// Public verification outcome for a document.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentCheckResponse {
    pub document_id: String,
    pub title: String,
    pub document_type: String,
    pub document_hash: String,
    /// Stored status of the document
    pub status: DocumentStatus,
    /// Derived outcome: `valid`, `revoked`, or `expired`
    pub outcome: String,
    /// Whether a revocation record exists or the status is revoked
    pub revoked: bool,
    pub issuance_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Document details released to a verifier redeeming an access token.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccessResponse {
    pub request_id: String,
    pub verifier_email: String,
    pub token_expires_at: DateTime<Utc>,
    pub document: StoredDocument,
}

/// Derive the public outcome for a document.
fn derive_outcome(
    document: &StoredDocument,
    revocation_record: bool,
    now: DateTime<Utc>,
) -> (&'static str, bool) {
    let revoked = document.status == DocumentStatus::Revoked || revocation_record;
    if revoked {
        ("revoked", true)
    } else if document.status == DocumentStatus::Expired || document.is_past_expiry(now) {
        ("expired", false)
    } else {
        ("valid", false)
    }
}

/// Publicly check a document's validity.
#[utoipa::path(
    get,
    path = "/v1/verify/documents/{document_id}",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    tag = "Verification",
    responses(
        (status = 200, description = "Verification outcome", body = DocumentCheckResponse),
        (status = 404, description = "Document not found")
    )
)]
pub async fn check_document(
    Path(document_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DocumentCheckResponse>, ApiError> {
    let document = DocumentRepository::new(&state.storage)
        .get(&document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    let revocation_record =
        RevocationRepository::new(&state.storage).is_document_revoked(&document_id);
    let (outcome, revoked) = derive_outcome(&document, revocation_record, Utc::now());

    Ok(Json(DocumentCheckResponse {
        document_id: document.id,
        title: document.title,
        document_type: document.document_type,
        document_hash: document.document_hash,
        status: document.status,
        outcome: outcome.to_string(),
        revoked,
        issuance_date: document.issuance_date,
        expiry_date: document.expiry_date,
    }))
}

/// File a verification request for a document.
#[utoipa::path(
    post,
    path = "/v1/verify/requests",
    request_body = CreateVerificationRequestBody,
    tag = "Verification",
    responses(
        (status = 201, description = "Request created", body = StoredVerificationRequest),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateVerificationRequestBody>,
) -> Result<(StatusCode, Json<StoredVerificationRequest>), ApiError> {
    if !body.verifier_email.contains('@') {
        return Err(ApiError::bad_request("Invalid verifier email"));
    }
    if body.purpose.trim().is_empty() {
        return Err(ApiError::bad_request("Purpose must not be empty"));
    }

    let document = DocumentRepository::new(&state.storage)
        .get(&body.document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    let request = StoredVerificationRequest {
        id: Uuid::new_v4().to_string(),
        document_id: document.id.clone(),
        owner_id: document.owner_id,
        verifier_email: body.verifier_email,
        purpose: body.purpose,
        status: VerificationStatus::Pending,
        token_created_at: None,
        token_expires_at: None,
        created_at: Utc::now(),
    };
    VerificationRepository::new(&state.storage).create(&request)?;

    let (ip, user_agent) = client_meta(&headers);
    let event = AuditEvent::new(AuditAction::VerificationRequested)
        .with_resource("verification_request", &request.id)
        .with_document(&request.document_id)
        .with_client(ip, user_agent)
        .with_details(serde_json::json!({ "verifier_email": request.verifier_email }));
    let _ = AuditRepository::new(&state.storage).log(&event);

    Ok((StatusCode::CREATED, Json(request)))
}

/// List verification requests for the caller's wallet.
#[utoipa::path(
    get,
    path = "/v1/verify/requests",
    params(VerificationQuery),
    tag = "Verification",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Matching requests", body = VerificationListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Issuers have no verification inbox")
    )
)]
pub async fn list_requests(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<VerificationQuery>,
) -> Result<Json<VerificationListResponse>, ApiError> {
    let repo = VerificationRepository::new(&state.storage);

    let requests = match user.role {
        Role::Admin => match params.owner_id {
            Some(owner_id) => repo.list_by_owner(&owner_id, params.status)?,
            None => {
                let mut all = repo.list_all()?;
                if let Some(status) = params.status {
                    all.retain(|r| r.status == status);
                }
                all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                all
            }
        },
        Role::Owner => repo.list_by_owner(&user.user_id, params.status)?,
        Role::Issuer => {
            return Err(ApiError::forbidden(
                "Verification requests are decided by document owners",
            ))
        }
    };
    let total = requests.len();

    Ok(Json(VerificationListResponse { requests, total }))
}

/// Approve a pending verification request.
#[utoipa::path(
    post,
    path = "/v1/verify/requests/{request_id}/approve",
    params(
        ("request_id" = String, Path, description = "Verification request identifier")
    ),
    tag = "Verification",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Request approved", body = ApproveResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not owned by the caller"),
        (status = 422, description = "Request already decided")
    )
)]
pub async fn approve_request(
    Auth(user): Auth,
    Path(request_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let repo = VerificationRepository::new(&state.storage);
    let mut request = load_owned_request(&repo, &request_id, &user)?;

    if request.status != VerificationStatus::Pending {
        return Err(ApiError::unprocessable(
            "Verification request has already been decided",
        ));
    }

    let now = Utc::now();
    let expires_at = now + Duration::hours(ACCESS_TOKEN_TTL_HOURS);
    request.status = VerificationStatus::Approved;
    request.token_created_at = Some(now);
    request.token_expires_at = Some(expires_at);
    repo.update(&request)?;

    let access_token = state.auth.tokens.mint(&request.id, expires_at);

    let event = AuditEvent::new(AuditAction::VerificationApproved)
        .with_actor(&user.user_id)
        .with_resource("verification_request", &request.id)
        .with_document(&request.document_id);
    let _ = AuditRepository::new(&state.storage).log(&event);

    Ok(Json(ApproveResponse {
        request,
        access_token,
    }))
}

/// Deny a pending verification request.
#[utoipa::path(
    post,
    path = "/v1/verify/requests/{request_id}/deny",
    params(
        ("request_id" = String, Path, description = "Verification request identifier")
    ),
    tag = "Verification",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Request denied", body = StoredVerificationRequest),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not owned by the caller"),
        (status = 422, description = "Request already decided")
    )
)]
pub async fn deny_request(
    Auth(user): Auth,
    Path(request_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StoredVerificationRequest>, ApiError> {
    let repo = VerificationRepository::new(&state.storage);
    let mut request = load_owned_request(&repo, &request_id, &user)?;

    if request.status != VerificationStatus::Pending {
        return Err(ApiError::unprocessable(
            "Verification request has already been decided",
        ));
    }

    request.status = VerificationStatus::Denied;
    repo.update(&request)?;

    let event = AuditEvent::new(AuditAction::VerificationDenied)
        .with_actor(&user.user_id)
        .with_resource("verification_request", &request.id)
        .with_document(&request.document_id);
    let _ = AuditRepository::new(&state.storage).log(&event);

    Ok(Json(request))
}

/// Redeem an access token for document details.
///
/// Requires an approved request, an unexpired token, and a still-active
/// document.
#[utoipa::path(
    get,
    path = "/v1/verify/access/{token}",
    params(
        ("token" = String, Path, description = "Access token from an approval")
    ),
    tag = "Verification",
    responses(
        (status = 200, description = "Document released", body = AccessResponse),
        (status = 401, description = "Token unrecognized or tampered"),
        (status = 403, description = "Token expired, request not approved, or document no longer active")
    )
)]
pub async fn redeem_access(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AccessResponse>, ApiError> {
    let parsed = AccessToken::parse(&token)
        .map_err(|_| ApiError::unauthorized("Invalid access token"))?;

    let request = VerificationRepository::new(&state.storage)
        .get(&parsed.request_id)
        .map_err(|_| ApiError::unauthorized("Invalid access token"))?;

    if request.status != VerificationStatus::Approved {
        return Err(ApiError::forbidden("Verification request is not approved"));
    }
    let expires_at = request
        .token_expires_at
        .ok_or_else(|| ApiError::forbidden("Verification request has no access token"))?;

    if !state.auth.tokens.verify(&parsed, expires_at) {
        return Err(ApiError::unauthorized("Invalid access token"));
    }

    let now = Utc::now();
    if expires_at < now {
        return Err(ApiError::forbidden("Access token has expired"));
    }

    let document = DocumentRepository::new(&state.storage)
        .get(&request.document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    let revocation_record =
        RevocationRepository::new(&state.storage).is_document_revoked(&document.id);
    let (outcome, _) = derive_outcome(&document, revocation_record, now);
    if outcome != "valid" {
        return Err(ApiError::forbidden(format!("Document is {outcome}")));
    }

    let event = AuditEvent::new(AuditAction::VerificationAccessed)
        .with_resource("verification_request", &request.id)
        .with_document(&document.id)
        .with_details(serde_json::json!({ "verifier_email": request.verifier_email }));
    let _ = AuditRepository::new(&state.storage).log(&event);

    Ok(Json(AccessResponse {
        request_id: request.id,
        verifier_email: request.verifier_email,
        token_expires_at: expires_at,
        document,
    }))
}

/// Load a request the user is allowed to decide (its owner, or an admin).
fn load_owned_request(
    repo: &VerificationRepository,
    request_id: &str,
    user: &crate::auth::AuthenticatedUser,
) -> Result<StoredVerificationRequest, ApiError> {
    let request = repo
        .get(request_id)
        .map_err(|_| ApiError::not_found("Verification request not found"))?;

    if !user.is_admin() {
        request
            .verify_ownership(user)
            .map_err(|_| ApiError::not_found("Verification request not found"))?;
    }

    Ok(request)
}
