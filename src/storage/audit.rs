// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for security-sensitive operations.
//!
//! Every auth event, issuance, revocation, verification decision, and
//! administrative action is appended to the audit store. Audit records are
//! write-only from the application's point of view; only admins read them
//! back, via the audit query endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FileStorage, StorageResult};

/// Types of auditable actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Auth events
    Signup,
    Signin,
    Logout,

    // Document events
    DocumentIssued,
    DocumentUpdated,
    DocumentDeleted,
    DocumentRevoked,
    DocumentExpired,

    // Verification events
    VerificationRequested,
    VerificationApproved,
    VerificationDenied,
    VerificationAccessed,

    // Admin events
    UserDeleted,
    AdminAccess,
}

impl AuditAction {
    /// Wire name of the action (the `snake_case` serde form).
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Signup => "signup",
            AuditAction::Signin => "signin",
            AuditAction::Logout => "logout",
            AuditAction::DocumentIssued => "document_issued",
            AuditAction::DocumentUpdated => "document_updated",
            AuditAction::DocumentDeleted => "document_deleted",
            AuditAction::DocumentRevoked => "document_revoked",
            AuditAction::DocumentExpired => "document_expired",
            AuditAction::VerificationRequested => "verification_requested",
            AuditAction::VerificationApproved => "verification_approved",
            AuditAction::VerificationDenied => "verification_denied",
            AuditAction::VerificationAccessed => "verification_accessed",
            AuditAction::UserDeleted => "user_deleted",
            AuditAction::AdminAccess => "admin_access",
        }
    }
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Action performed.
    pub action: AuditAction,
    /// User who performed the action (if known; public verification
    /// endpoints have no actor).
    pub actor_id: Option<String>,
    /// Resource affected (document, verification_request, user).
    pub resource_type: Option<String>,
    /// ID of the affected resource.
    pub resource_id: Option<String>,
    /// Related document, when the resource itself is not a document.
    pub document_id: Option<String>,
    /// Client IP address (from X-Forwarded-For, if present).
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if the operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(action: AuditAction) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            actor_id: None,
            resource_type: None,
            resource_id: None,
            document_id: None,
            ip_address: None,
            user_agent: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the acting user.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Set the related document.
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Set the client IP and user agent.
    pub fn with_client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Log an audit event.
    ///
    /// Events are appended to a daily log file in JSONL format.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.storage.paths().audit_events_file(&date);

        // Read existing events (or empty if file doesn't exist)
        let mut content = self.storage.read_raw(&path).unwrap_or_default();

        // Append new event as JSONL (one JSON object per line)
        let event_json = serde_json::to_string(event).map_err(|e| {
            super::StorageError::SerializationError(format!(
                "Failed to serialize audit event: {}",
                e
            ))
        })?;

        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        content.extend_from_slice(event_json.as_bytes());
        content.push(b'\n');

        self.storage.write_raw(&path, &content)
    }

    /// Read audit events for a specific date.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.storage.paths().audit_events_file(date);
        let content = self.storage.read_raw(&path)?;

        let content_str = String::from_utf8(content).map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid UTF-8 in audit log: {}", e))
        })?;

        let mut events = Vec::new();
        for line in content_str.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(line).map_err(|e| {
                super::StorageError::SerializationError(format!(
                    "Failed to deserialize audit event: {}",
                    e
                ))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    /// Read events for a date range.
    pub fn read_events_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> StorageResult<Vec<AuditEvent>> {
        use chrono::NaiveDate;

        let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid start date: {}", e))
        })?;

        let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid end date: {}", e))
        })?;

        let mut all_events = Vec::new();
        let mut current = start;

        while current <= end {
            let date_str = current.format("%Y-%m-%d").to_string();
            if let Ok(events) = self.read_events(&date_str) {
                all_events.extend(events);
            }
            current = current.succ_opt().ok_or_else(|| {
                super::StorageError::SerializationError("Date overflow".to_string())
            })?;
        }

        Ok(all_events)
    }
}

/// Helper macro for logging audit events.
#[macro_export]
macro_rules! audit_log {
    ($storage:expr, $action:expr, $user:expr) => {{
        let repo = $crate::storage::AuditRepository::new($storage);
        let event = $crate::storage::AuditEvent::new($action).with_actor(&$user.user_id);
        let _ = repo.log(&event);
    }};
    ($storage:expr, $action:expr, $user:expr, $resource_type:expr, $resource_id:expr) => {{
        let repo = $crate::storage::AuditRepository::new($storage);
        let event = $crate::storage::AuditEvent::new($action)
            .with_actor(&$user.user_id)
            .with_resource($resource_type, $resource_id);
        let _ = repo.log(&event);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, StoragePaths};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditAction::DocumentRevoked)
            .with_actor("user_123")
            .with_resource("document", "doc_abc")
            .with_client(Some("192.168.1.1".to_string()), Some("curl/8".to_string()));

        assert_eq!(event.action, AuditAction::DocumentRevoked);
        assert_eq!(event.actor_id, Some("user_123".to_string()));
        assert_eq!(event.resource_type, Some("document".to_string()));
        assert_eq!(event.resource_id, Some("doc_abc".to_string()));
        assert_eq!(event.ip_address, Some("192.168.1.1".to_string()));
        assert!(event.success);
    }

    #[test]
    fn failed_event() {
        let event = AuditEvent::new(AuditAction::Signin)
            .with_actor("user_123")
            .failed("Invalid credentials");

        assert!(!event.success);
        assert_eq!(event.error, Some("Invalid credentials".to_string()));
    }

    #[test]
    fn log_and_read_events() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);

        let event1 = AuditEvent::new(AuditAction::DocumentIssued)
            .with_actor("issuer_1")
            .with_resource("document", "d1");

        let event2 = AuditEvent::new(AuditAction::VerificationApproved)
            .with_actor("owner_1")
            .with_resource("verification_request", "vr1")
            .with_document("d1");

        repo.log(&event1).unwrap();
        repo.log(&event2).unwrap();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let events = repo.read_events(&today).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::DocumentIssued);
        assert_eq!(events[1].action, AuditAction::VerificationApproved);
        assert_eq!(events[1].document_id, Some("d1".to_string()));
    }

    #[test]
    fn read_events_range_spans_missing_days() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);

        repo.log(&AuditEvent::new(AuditAction::Signin).with_actor("u1"))
            .unwrap();

        let today = Utc::now().date_naive();
        let start = (today - chrono::Days::new(2)).format("%Y-%m-%d").to_string();
        let end = today.format("%Y-%m-%d").to_string();

        let events = repo.read_events_range(&start, &end).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn action_wire_names_match_serde() {
        for action in [
            AuditAction::Signup,
            AuditAction::DocumentIssued,
            AuditAction::VerificationApproved,
            AuditAction::UserDeleted,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
