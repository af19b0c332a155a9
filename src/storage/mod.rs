// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Record Storage Module
//!
//! Persistent storage for Signatura records: one JSON file per record under
//! the data root (`DATA_DIR`, default `data/`), plus append-only daily JSONL
//! audit logs. Writes are atomic (temp file + rename).
//!
//! ## Storage Layout
//!
//! ```text
//! data/
//!   users/{user_id}.json           # Profile + bcrypt hash (hash never served)
//!   documents/{document_id}.json   # Issued credentials
//!   verifications/{request_id}.json
//!   revocations/{revocation_id}.json
//!   audit/{date}/events.jsonl      # Daily audit logs
//! ```

pub mod audit;
pub mod files;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use audit::{AuditAction, AuditEvent, AuditRepository};
pub use files::{FileStorage, StorageError, StorageResult};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use paths::StoragePaths;
pub use repository::{
    normalize_email, DocumentRepository, DocumentStatus, RevocationRepository, StoredDocument,
    StoredRevocation, StoredUser, StoredVerificationRequest, UserRepository, UserResponse,
    VerificationRepository, VerificationStatus,
};
