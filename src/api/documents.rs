// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Document endpoints: issuance, listing, update, deletion, revocation.
//!
//! Issuers create documents for owners; owners see what they hold; admins
//! see everything. Revocation writes a revocation record and then flips the
//! document status, in that order. The two writes are not atomic; the
//! public verification check treats either signal as revoked.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::{AdminOnly, Auth, AuthenticatedUser, IssuerOnly, Role},
    error::ApiError,
    state::AppState,
    storage::{
        AuditAction, AuditEvent, AuditRepository, DocumentRepository, DocumentStatus, FileStorage,
        RevocationRepository, StoredDocument, StoredRevocation, UserRepository,
    },
};

/// Request body for POST /v1/documents.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    /// Email of the owner who will hold the document
    pub owner_email: String,
    /// Human-readable title
    pub title: String,
    /// Document type (diploma, license, certificate, ...)
    pub document_type: String,
    /// Hex-encoded SHA-256 hash of the document content.
    /// Computed from the title when omitted.
    #[serde(default)]
    pub document_hash: Option<String>,
    /// Issuance date; defaults to now
    #[serde(default)]
    pub issuance_date: Option<DateTime<Utc>>,
    /// Expiry date, if the credential expires
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Request body for PUT /v1/documents/{id}.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Request body for POST /v1/documents/{id}/revoke.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RevokeDocumentRequest {
    /// Stated reason for the revocation
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query parameters for GET /v1/documents.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DocumentQuery {
    /// Filter by issuer (admins only; issuers are pinned to themselves)
    pub issuer_id: Option<String>,
    /// Filter by owner (admins and issuers; owners are pinned to themselves)
    pub owner_id: Option<String>,
    /// Filter by status
    pub status: Option<DocumentStatus>,
}

/// Response for document listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<StoredDocument>,
    pub total: usize,
}

fn is_hex_sha256(hash: &str) -> bool {
    hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

/// Whether the user may see this document.
fn can_view(user: &AuthenticatedUser, document: &StoredDocument) -> bool {
    user.is_admin() || document.issuer_id == user.user_id || document.owner_id == user.user_id
}

/// Issue a new document to an owner.
#[utoipa::path(
    post,
    path = "/v1/documents",
    request_body = CreateDocumentRequest,
    tag = "Documents",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Document issued", body = StoredDocument),
        (status = 400, description = "Invalid hash or unknown owner"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an issuer")
    )
)]
pub async fn create_document(
    IssuerOnly(user): IssuerOnly,
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<StoredDocument>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title must not be empty"));
    }

    let owner = UserRepository::new(&state.storage)
        .find_by_email(&request.owner_email)?
        .ok_or_else(|| ApiError::bad_request("No account found for owner email"))?;

    let document_hash = match request.document_hash {
        Some(hash) => {
            let hash = hash.to_lowercase();
            if !is_hex_sha256(&hash) {
                return Err(ApiError::bad_request(
                    "document_hash must be a hex-encoded SHA-256 digest",
                ));
            }
            hash
        }
        // No digest supplied: fingerprint the title
        None => hex::encode(Sha256::digest(request.title.as_bytes())),
    };

    let now = Utc::now();
    let document = StoredDocument {
        id: Uuid::new_v4().to_string(),
        issuer_id: user.user_id.clone(),
        owner_id: owner.id,
        title: request.title,
        document_type: request.document_type,
        document_hash,
        status: DocumentStatus::Active,
        issuance_date: request.issuance_date.unwrap_or(now),
        expiry_date: request.expiry_date,
        created_at: now,
        updated_at: now,
    };
    DocumentRepository::new(&state.storage).create(&document)?;

    let event = AuditEvent::new(AuditAction::DocumentIssued)
        .with_actor(&user.user_id)
        .with_resource("document", &document.id)
        .with_details(serde_json::json!({ "owner_id": document.owner_id }));
    let _ = AuditRepository::new(&state.storage).log(&event);

    Ok((StatusCode::CREATED, Json(document)))
}

/// List documents visible to the caller.
///
/// Admins may filter freely; issuers see documents they issued; owners see
/// documents they hold.
#[utoipa::path(
    get,
    path = "/v1/documents",
    params(DocumentQuery),
    tag = "Documents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Matching documents", body = DocumentListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_documents(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<DocumentQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    // Non-admins are pinned to their own documents regardless of the query
    let (issuer_filter, owner_filter) = match user.role {
        Role::Admin => (params.issuer_id.as_deref(), params.owner_id.as_deref()),
        Role::Issuer => (Some(user.user_id.as_str()), params.owner_id.as_deref()),
        Role::Owner => (params.issuer_id.as_deref(), Some(user.user_id.as_str())),
    };

    let documents = DocumentRepository::new(&state.storage).list_filtered(
        issuer_filter,
        owner_filter,
        params.status,
    )?;
    let total = documents.len();

    Ok(Json(DocumentListResponse { documents, total }))
}

/// Fetch a single document.
#[utoipa::path(
    get,
    path = "/v1/documents/{document_id}",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    tag = "Documents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The document", body = StoredDocument),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not visible to the caller")
    )
)]
pub async fn get_document(
    Auth(user): Auth,
    Path(document_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StoredDocument>, ApiError> {
    let document = DocumentRepository::new(&state.storage)
        .get(&document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    if !can_view(&user, &document) {
        return Err(ApiError::not_found("Document not found"));
    }

    Ok(Json(document))
}

/// Update a document's metadata.
#[utoipa::path(
    put,
    path = "/v1/documents/{document_id}",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    request_body = UpdateDocumentRequest,
    tag = "Documents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated document", body = StoredDocument),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not issued by the caller")
    )
)]
pub async fn update_document(
    Auth(user): Auth,
    Path(document_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<Json<StoredDocument>, ApiError> {
    let repo = DocumentRepository::new(&state.storage);
    let mut document = repo
        .get(&document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    if !user.is_admin() && document.issuer_id != user.user_id {
        return Err(ApiError::not_found("Document not found"));
    }

    if let Some(title) = request.title {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("Title must not be empty"));
        }
        document.title = title;
    }
    if let Some(document_type) = request.document_type {
        document.document_type = document_type;
    }
    if let Some(expiry_date) = request.expiry_date {
        document.expiry_date = Some(expiry_date);
    }
    document.updated_at = Utc::now();
    repo.update(&document)?;

    crate::audit_log!(
        &state.storage,
        AuditAction::DocumentUpdated,
        &user,
        "document",
        &document.id
    );

    Ok(Json(document))
}

/// Delete a document (admin only).
#[utoipa::path(
    delete,
    path = "/v1/documents/{document_id}",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    tag = "Documents",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn delete_document(
    AdminOnly(user): AdminOnly,
    Path(document_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    DocumentRepository::new(&state.storage)
        .delete(&document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    crate::audit_log!(
        &state.storage,
        AuditAction::DocumentDeleted,
        &user,
        "document",
        &document_id
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke a document.
///
/// Issuers can revoke documents they issued; admins can revoke any.
#[utoipa::path(
    post,
    path = "/v1/documents/{document_id}/revoke",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    request_body = RevokeDocumentRequest,
    tag = "Documents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document revoked", body = StoredDocument),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not issued by the caller"),
        (status = 422, description = "Already revoked")
    )
)]
pub async fn revoke_document(
    Auth(user): Auth,
    Path(document_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RevokeDocumentRequest>,
) -> Result<Json<StoredDocument>, ApiError> {
    let document = DocumentRepository::new(&state.storage)
        .get(&document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    if !user.is_admin() && document.issuer_id != user.user_id {
        return Err(ApiError::not_found("Document not found"));
    }

    let document = perform_revocation(&state.storage, &document_id, &user, request.reason)?;
    Ok(Json(document))
}

/// Revoke a document: write the revocation record, then flip the status.
///
/// The two writes are sequential, not atomic. The public verification check
/// treats either signal as revoked, so a crash between them fails safe.
pub(crate) fn perform_revocation(
    storage: &FileStorage,
    document_id: &str,
    actor: &AuthenticatedUser,
    reason: Option<String>,
) -> Result<StoredDocument, ApiError> {
    let documents = DocumentRepository::new(storage);
    let mut document = documents
        .get(document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    if document.status == DocumentStatus::Revoked {
        return Err(ApiError::unprocessable("Document is already revoked"));
    }

    let revocation = StoredRevocation {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        revoked_by_id: actor.user_id.clone(),
        reason: reason.clone(),
        created_at: Utc::now(),
    };
    RevocationRepository::new(storage).create(&revocation)?;

    document.status = DocumentStatus::Revoked;
    document.updated_at = Utc::now();
    documents.update(&document)?;

    let event = AuditEvent::new(AuditAction::DocumentRevoked)
        .with_actor(&actor.user_id)
        .with_resource("document", document_id)
        .with_details(serde_json::json!({ "reason": reason }));
    let _ = AuditRepository::new(storage).log(&event);

    Ok(document)
}
