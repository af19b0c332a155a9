// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Document repository.
//!
//! A document is an issued credential: a title, a type, and a SHA-256 hash,
//! linked to the issuer who created it and the owner who holds it. Status
//! moves from `active` to `revoked` (by issuer/admin action) or `expired`
//! (by the background sweeper once `expiry_date` passes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};

/// Document status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Document is valid and verifiable
    Active,
    /// Document was revoked by its issuer or an admin
    Revoked,
    /// Document passed its expiry date
    Expired,
}

impl Default for DocumentStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Active => write!(f, "active"),
            DocumentStatus::Revoked => write!(f, "revoked"),
            DocumentStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Issued document stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredDocument {
    /// Unique document identifier (UUID)
    pub id: String,
    /// User ID of the issuer who created the document
    pub issuer_id: String,
    /// User ID of the owner holding the document
    pub owner_id: String,
    /// Human-readable title
    pub title: String,
    /// Document type (diploma, license, certificate, ...)
    pub document_type: String,
    /// Hex-encoded SHA-256 hash of the document content
    pub document_hash: String,
    /// Current status
    pub status: DocumentStatus,
    /// When the credential was issued
    pub issuance_date: DateTime<Utc>,
    /// When the credential expires, if it does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Whether the document is past its expiry date at `now`.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < now)
    }
}

impl super::super::OwnedResource for StoredDocument {
    fn owner_user_id(&self) -> &str {
        &self.owner_id
    }
}

/// Repository for document operations.
pub struct DocumentRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> DocumentRepository<'a> {
    /// Create a new DocumentRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if a document exists.
    pub fn exists(&self, document_id: &str) -> bool {
        self.storage
            .exists(self.storage.paths().document(document_id))
    }

    /// Get a document by ID.
    pub fn get(&self, document_id: &str) -> StorageResult<StoredDocument> {
        let path = self.storage.paths().document(document_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Document {document_id}")));
        }
        self.storage.read_json(path)
    }

    /// Create a new document.
    pub fn create(&self, document: &StoredDocument) -> StorageResult<()> {
        let document_id = &document.id;

        if self.exists(document_id) {
            return Err(StorageError::AlreadyExists(format!(
                "Document {document_id}"
            )));
        }

        self.storage
            .write_json(self.storage.paths().document(document_id), document)
    }

    /// Update an existing document.
    pub fn update(&self, document: &StoredDocument) -> StorageResult<()> {
        let document_id = &document.id;

        if !self.exists(document_id) {
            return Err(StorageError::NotFound(format!("Document {document_id}")));
        }

        self.storage
            .write_json(self.storage.paths().document(document_id), document)
    }

    /// Delete a document.
    pub fn delete(&self, document_id: &str) -> StorageResult<()> {
        if !self.exists(document_id) {
            return Err(StorageError::NotFound(format!("Document {document_id}")));
        }

        self.storage
            .delete(self.storage.paths().document(document_id))
    }

    /// List all documents (admin view and sweeper).
    pub fn list_all(&self) -> StorageResult<Vec<StoredDocument>> {
        let document_ids = self
            .storage
            .list_files(self.storage.paths().documents_dir(), "json")?;

        let mut documents = Vec::new();
        for id in document_ids {
            if let Ok(document) = self.get(&id) {
                documents.push(document);
            }
        }

        Ok(documents)
    }

    /// List documents matching the given filters.
    ///
    /// `None` filters match everything, mirroring the query-parameter
    /// semantics of the documents endpoint.
    pub fn list_filtered(
        &self,
        issuer_id: Option<&str>,
        owner_id: Option<&str>,
        status: Option<DocumentStatus>,
    ) -> StorageResult<Vec<StoredDocument>> {
        let mut documents = self.list_all()?;

        if let Some(issuer_id) = issuer_id {
            documents.retain(|d| d.issuer_id == issuer_id);
        }
        if let Some(owner_id) = owner_id {
            documents.retain(|d| d.owner_id == owner_id);
        }
        if let Some(status) = status {
            documents.retain(|d| d.status == status);
        }

        // Newest first
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(documents)
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

    fn test_document(id: &str, issuer: &str, owner: &str) -> StoredDocument {
        let now = Utc::now();
        StoredDocument {
            id: id.to_string(),
            issuer_id: issuer.to_string(),
            owner_id: owner.to_string(),
            title: "BSc Computer Science".to_string(),
            document_type: "diploma".to_string(),
            document_hash: "ab".repeat(32),
            status: DocumentStatus::Active,
            issuance_date: now,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_and_get_document() {
        let (_temp, storage) = test_storage();
        let repo = DocumentRepository::new(&storage);

        let document = test_document("d-1", "issuer-1", "owner-1");
        repo.create(&document).unwrap();

        let loaded = repo.get("d-1").unwrap();
        assert_eq!(loaded.title, document.title);
        assert_eq!(loaded.status, DocumentStatus::Active);
    }

    #[test]
    fn list_filtered_by_issuer_owner_and_status() {
        let (_temp, storage) = test_storage();
        let repo = DocumentRepository::new(&storage);

        repo.create(&test_document("d-1", "issuer-1", "owner-1")).unwrap();
        repo.create(&test_document("d-2", "issuer-1", "owner-2")).unwrap();

        let mut revoked = test_document("d-3", "issuer-2", "owner-1");
        revoked.status = DocumentStatus::Revoked;
        repo.create(&revoked).unwrap();

        let by_issuer = repo.list_filtered(Some("issuer-1"), None, None).unwrap();
        assert_eq!(by_issuer.len(), 2);

        let by_owner = repo.list_filtered(None, Some("owner-1"), None).unwrap();
        assert_eq!(by_owner.len(), 2);

        let active_for_owner = repo
            .list_filtered(None, Some("owner-1"), Some(DocumentStatus::Active))
            .unwrap();
        assert_eq!(active_for_owner.len(), 1);
        assert_eq!(active_for_owner[0].id, "d-1");
    }

    #[test]
    fn is_past_expiry_checks_date() {
        let now = Utc::now();
        let mut document = test_document("d-1", "i", "o");
        assert!(!document.is_past_expiry(now));

        document.expiry_date = Some(now - chrono::Duration::days(1));
        assert!(document.is_past_expiry(now));

        document.expiry_date = Some(now + chrono::Duration::days(1));
        assert!(!document.is_past_expiry(now));
    }

    #[test]
    fn update_and_delete_missing_document_errors() {
        let (_temp, storage) = test_storage();
        let repo = DocumentRepository::new(&storage);

        let document = test_document("ghost", "i", "o");
        assert!(matches!(
            repo.update(&document),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(repo.delete("ghost"), Err(StorageError::NotFound(_))));
    }
}
