// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification request repository.
//!
//! A verifier (not a login role) asks to see a document; the owner approves
//! or denies. Approval stamps `token_created_at`/`token_expires_at` and the
//! API mints an access token bound to those timestamps. The only legal
//! transitions are `pending -> approved` and `pending -> denied`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};

/// Verification request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Waiting for the owner's decision
    Pending,
    /// Owner granted access; token timestamps are set
    Approved,
    /// Owner denied access
    Denied,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Approved => write!(f, "approved"),
            VerificationStatus::Denied => write!(f, "denied"),
        }
    }
}

/// Verification request stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredVerificationRequest {
    /// Unique request identifier (UUID)
    pub id: String,
    /// Document the verifier wants to see
    pub document_id: String,
    /// Owner who decides the request (copied from the document at creation)
    pub owner_id: String,
    /// Verifier's email address
    pub verifier_email: String,
    /// Stated purpose of the verification
    pub purpose: String,
    /// Current status
    pub status: VerificationStatus,
    /// When the access token was created (set on approval)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_created_at: Option<DateTime<Utc>>,
    /// When the access token expires (set on approval)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl super::super::OwnedResource for StoredVerificationRequest {
    fn owner_user_id(&self) -> &str {
        &self.owner_id
    }
}

/// Repository for verification request operations.
pub struct VerificationRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> VerificationRepository<'a> {
    /// Create a new VerificationRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if a request exists.
    pub fn exists(&self, request_id: &str) -> bool {
        self.storage
            .exists(self.storage.paths().verification(request_id))
    }

    /// Get a request by ID.
    pub fn get(&self, request_id: &str) -> StorageResult<StoredVerificationRequest> {
        let path = self.storage.paths().verification(request_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Verification request {request_id}"
            )));
        }
        self.storage.read_json(path)
    }

    /// Create a new request.
    pub fn create(&self, request: &StoredVerificationRequest) -> StorageResult<()> {
        let request_id = &request.id;

        if self.exists(request_id) {
            return Err(StorageError::AlreadyExists(format!(
                "Verification request {request_id}"
            )));
        }

        self.storage
            .write_json(self.storage.paths().verification(request_id), request)
    }

    /// Persist an updated request.
    pub fn update(&self, request: &StoredVerificationRequest) -> StorageResult<()> {
        let request_id = &request.id;

        if !self.exists(request_id) {
            return Err(StorageError::NotFound(format!(
                "Verification request {request_id}"
            )));
        }

        self.storage
            .write_json(self.storage.paths().verification(request_id), request)
    }

    /// Delete a request.
    pub fn delete(&self, request_id: &str) -> StorageResult<()> {
        if !self.exists(request_id) {
            return Err(StorageError::NotFound(format!(
                "Verification request {request_id}"
            )));
        }

        self.storage
            .delete(self.storage.paths().verification(request_id))
    }

    /// List all requests (admin view).
    pub fn list_all(&self) -> StorageResult<Vec<StoredVerificationRequest>> {
        let request_ids = self
            .storage
            .list_files(self.storage.paths().verifications_dir(), "json")?;

        let mut requests = Vec::new();
        for id in request_ids {
            if let Ok(request) = self.get(&id) {
                requests.push(request);
            }
        }

        Ok(requests)
    }

    /// List requests for an owner, optionally filtered by status.
    pub fn list_by_owner(
        &self,
        owner_id: &str,
        status: Option<VerificationStatus>,
    ) -> StorageResult<Vec<StoredVerificationRequest>> {
        let mut requests = self.list_all()?;
        requests.retain(|r| r.owner_id == owner_id);
        if let Some(status) = status {
            requests.retain(|r| r.status == status);
        }

        // Newest first
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().expect("Failed to initialize");
        (temp, storage)
    }

    fn test_request(id: &str, owner: &str) -> StoredVerificationRequest {
        StoredVerificationRequest {
            id: id.to_string(),
            document_id: "doc-1".to_string(),
            owner_id: owner.to_string(),
            verifier_email: "hr@acme.example".to_string(),
            purpose: "Employment screening".to_string(),
            status: VerificationStatus::Pending,
            token_created_at: None,
            token_expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_request() {
        let (_temp, storage) = test_storage();
        let repo = VerificationRepository::new(&storage);

        repo.create(&test_request("vr-1", "owner-1")).unwrap();

        let loaded = repo.get("vr-1").unwrap();
        assert_eq!(loaded.status, VerificationStatus::Pending);
        assert!(loaded.token_expires_at.is_none());
    }

    #[test]
    fn list_by_owner_filters_and_sorts() {
        let (_temp, storage) = test_storage();
        let repo = VerificationRepository::new(&storage);

        repo.create(&test_request("vr-1", "owner-1")).unwrap();
        repo.create(&test_request("vr-2", "owner-2")).unwrap();

        let mut approved = test_request("vr-3", "owner-1");
        approved.status = VerificationStatus::Approved;
        repo.create(&approved).unwrap();

        let all = repo.list_by_owner("owner-1", None).unwrap();
        assert_eq!(all.len(), 2);

        let pending = repo
            .list_by_owner("owner-1", Some(VerificationStatus::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "vr-1");
    }

    #[test]
    fn update_persists_transition() {
        let (_temp, storage) = test_storage();
        let repo = VerificationRepository::new(&storage);

        let mut request = test_request("vr-1", "owner-1");
        repo.create(&request).unwrap();

        let now = Utc::now();
        request.status = VerificationStatus::Approved;
        request.token_created_at = Some(now);
        request.token_expires_at = Some(now + chrono::Duration::hours(24));
        repo.update(&request).unwrap();

        let loaded = repo.get("vr-1").unwrap();
        assert_eq!(loaded.status, VerificationStatus::Approved);
        assert!(loaded.token_expires_at.is_some());
    }

    #[test]
    fn missing_request_errors() {
        let (_temp, storage) = test_storage();
        let repo = VerificationRepository::new(&storage);

        assert!(matches!(repo.get("ghost"), Err(StorageError::NotFound(_))));
        assert!(matches!(
            repo.update(&test_request("ghost", "o")),
            Err(StorageError::NotFound(_))
        ));
    }
}
