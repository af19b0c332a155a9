// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the record storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent storage.
/// Override with the `DATA_DIR` environment variable.
pub const DATA_ROOT: &str = "data";

/// Storage path utilities for the record store.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user profiles.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a specific user profile file.
    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    // ========== Document Paths ==========

    /// Directory containing all issued documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    /// Path to a specific document file.
    pub fn document(&self, document_id: &str) -> PathBuf {
        self.documents_dir().join(format!("{document_id}.json"))
    }

    // ========== Verification Request Paths ==========

    /// Directory containing all verification requests.
    pub fn verifications_dir(&self) -> PathBuf {
        self.root.join("verifications")
    }

    /// Path to a specific verification request file.
    pub fn verification(&self, request_id: &str) -> PathBuf {
        self.verifications_dir().join(format!("{request_id}.json"))
    }

    // ========== Revocation Paths ==========

    /// Directory containing all revocation records.
    pub fn revocations_dir(&self) -> PathBuf {
        self.root.join("revocations")
    }

    /// Path to a specific revocation record file.
    pub fn revocation(&self, revocation_id: &str) -> PathBuf {
        self.revocations_dir().join(format!("{revocation_id}.json"))
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("data"));
    }

    #[test]
    fn custom_root_for_testing() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.root(), Path::new("/tmp/test-data"));
        assert_eq!(
            paths.user("user-123"),
            PathBuf::from("/tmp/test-data/users/user-123.json")
        );
    }

    #[test]
    fn record_paths_are_correct() {
        let paths = StoragePaths::new("/data");
        assert_eq!(paths.users_dir(), PathBuf::from("/data/users"));
        assert_eq!(
            paths.document("doc-1"),
            PathBuf::from("/data/documents/doc-1.json")
        );
        assert_eq!(
            paths.verification("vr-1"),
            PathBuf::from("/data/verifications/vr-1.json")
        );
        assert_eq!(
            paths.revocation("rev-1"),
            PathBuf::from("/data/revocations/rev-1.json")
        );
    }

    #[test]
    fn audit_paths_are_correct() {
        let paths = StoragePaths::new("/data");
        assert_eq!(paths.audit_dir(), PathBuf::from("/data/audit"));
        assert_eq!(
            paths.audit_events_file("2026-02-01"),
            PathBuf::from("/data/audit/2026-02-01/events.jsonl")
        );
    }
}
