// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to record storage.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the FileStorage for all file operations.

pub mod documents;
pub mod revocations;
pub mod users;
pub mod verifications;

pub use documents::{DocumentRepository, DocumentStatus, StoredDocument};
pub use revocations::{RevocationRepository, StoredRevocation};
pub use users::{normalize_email, StoredUser, UserRepository, UserResponse};
pub use verifications::{StoredVerificationRequest, VerificationRepository, VerificationStatus};
