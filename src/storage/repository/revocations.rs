// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Revocation record repository.
//!
//! Revoking a document writes a revocation record here AND flips the
//! document's status; the two writes are sequential, not atomic. The public
//! verification check treats either signal as revoked, so a crash between
//! the writes fails safe for verifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};

/// Revocation record stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredRevocation {
    /// Unique revocation identifier (UUID)
    pub id: String,
    /// The revoked document
    pub document_id: String,
    /// User who revoked it (issuer or admin)
    pub revoked_by_id: String,
    /// Stated reason, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the revocation happened
    pub created_at: DateTime<Utc>,
}

/// Repository for revocation records.
pub struct RevocationRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> RevocationRepository<'a> {
    /// Create a new RevocationRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Get a revocation record by ID.
    pub fn get(&self, revocation_id: &str) -> StorageResult<StoredRevocation> {
        let path = self.storage.paths().revocation(revocation_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Revocation {revocation_id}"
            )));
        }
        self.storage.read_json(path)
    }

    /// Create a new revocation record.
    pub fn create(&self, revocation: &StoredRevocation) -> StorageResult<()> {
        let revocation_id = &revocation.id;

        if self.storage.exists(self.storage.paths().revocation(revocation_id)) {
            return Err(StorageError::AlreadyExists(format!(
                "Revocation {revocation_id}"
            )));
        }

        self.storage
            .write_json(self.storage.paths().revocation(revocation_id), revocation)
    }

    /// Find the revocation record for a document, if any.
    pub fn find_by_document(&self, document_id: &str) -> StorageResult<Option<StoredRevocation>> {
        let revocation_ids = self
            .storage
            .list_files(self.storage.paths().revocations_dir(), "json")?;

        for id in revocation_ids {
            if let Ok(revocation) = self.get(&id) {
                if revocation.document_id == document_id {
                    return Ok(Some(revocation));
                }
            }
        }

        Ok(None)
    }

    /// Whether a document has a revocation record.
    pub fn is_document_revoked(&self, document_id: &str) -> bool {
        matches!(self.find_by_document(document_id), Ok(Some(_)))
    }

    /// List all revocation records (admin view).
    pub fn list_all(&self) -> StorageResult<Vec<StoredRevocation>> {
        let revocation_ids = self
            .storage
            .list_files(self.storage.paths().revocations_dir(), "json")?;

        let mut revocations = Vec::new();
        for id in revocation_ids {
            if let Ok(revocation) = self.get(&id) {
                revocations.push(revocation);
            }
        }

        Ok(revocations)
    }
}
