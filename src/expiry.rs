// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Expiry Sweeper
//!
//! Background task that periodically transitions documents past their
//! `expiry_date` from `active` to `expired`. Between sweeps the public
//! verification check already derives `expired` from the date, so the
//! sweep only persists what verifiers would have been told anyway.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::storage::{
    AuditAction, AuditEvent, AuditRepository, DocumentRepository, DocumentStatus, FileStorage,
};

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Background sweeper that expires documents past their expiry date.
pub struct ExpirySweeper {
    storage: FileStorage,
    sweep_interval: Duration,
}

impl ExpirySweeper {
    /// Create a new sweeper over the given storage.
    pub fn new(storage: FileStorage) -> Self {
        Self {
            storage,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Override the sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Run the sweeper loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Document expiry sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Document expiry sweeper shutting down");
                return;
            }

            let expired = sweep_expired_documents(&self.storage);
            if expired > 0 {
                info!(count = expired, "Expiry sweeper: documents expired");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Document expiry sweeper shutting down");
                    return;
                }
            }
        }
    }
}

/// Execute one sweep: mark active documents past their expiry date as
/// expired. Returns the number of documents transitioned.
pub fn sweep_expired_documents(storage: &FileStorage) -> usize {
    let repo = DocumentRepository::new(storage);
    let documents = match repo.list_all() {
        Ok(documents) => documents,
        Err(e) => {
            warn!(error = %e, "Expiry sweeper: failed to list documents");
            return 0;
        }
    };

    let now = Utc::now();
    let mut expired = 0;

    for mut document in documents {
        if document.status != DocumentStatus::Active || !document.is_past_expiry(now) {
            continue;
        }

        document.status = DocumentStatus::Expired;
        document.updated_at = now;

        match repo.update(&document) {
            Ok(()) => {
                expired += 1;
                let event = AuditEvent::new(AuditAction::DocumentExpired)
                    .with_resource("document", &document.id);
                let _ = AuditRepository::new(storage).log(&event);
            }
            Err(e) => {
                warn!(
                    document_id = %document.id,
                    error = %e,
                    "Expiry sweeper: failed to expire document"
                );
            }
        }
    }

    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StoragePaths, StoredDocument};
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    fn seed_document(storage: &FileStorage, id: &str, expiry_offset_hours: i64) {
        let now = Utc::now();
        DocumentRepository::new(storage)
            .create(&StoredDocument {
                id: id.to_string(),
                issuer_id: "issuer-1".to_string(),
                owner_id: "owner-1".to_string(),
                title: "Title".to_string(),
                document_type: "license".to_string(),
                document_hash: "ab".repeat(32),
                status: DocumentStatus::Active,
                issuance_date: now,
                expiry_date: Some(now + ChronoDuration::hours(expiry_offset_hours)),
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    #[test]
    fn sweep_expires_only_overdue_active_documents() {
        let (_temp, storage) = test_storage();
        seed_document(&storage, "overdue", -1);
        seed_document(&storage, "current", 24);

        let expired = sweep_expired_documents(&storage);
        assert_eq!(expired, 1);

        let repo = DocumentRepository::new(&storage);
        assert_eq!(repo.get("overdue").unwrap().status, DocumentStatus::Expired);
        assert_eq!(repo.get("current").unwrap().status, DocumentStatus::Active);

        // Second sweep is a no-op
        assert_eq!(sweep_expired_documents(&storage), 0);
    }

    #[test]
    fn sweep_leaves_revoked_documents_alone() {
        let (_temp, storage) = test_storage();
        seed_document(&storage, "revoked-overdue", -1);

        let repo = DocumentRepository::new(&storage);
        let mut document = repo.get("revoked-overdue").unwrap();
        document.status = DocumentStatus::Revoked;
        repo.update(&document).unwrap();

        assert_eq!(sweep_expired_documents(&storage), 0);
        assert_eq!(
            repo.get("revoked-overdue").unwrap().status,
            DocumentStatus::Revoked
        );
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let (_temp, storage) = test_storage();
        let sweeper = ExpirySweeper::new(storage).with_interval(Duration::from_millis(10));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper stops promptly")
            .unwrap();
    }
}
