// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User profile repository.
//!
//! Each profile is a JSON file under `users/`. Emails are NFKC-normalized
//! and lowercased before storage and lookup, so `Alice@Example.COM` and
//! `alice@example.com` are the same account.
//!
//! The bcrypt password hash lives in the stored record and is NEVER
//! returned via API; handlers convert to [`UserResponse`] first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;

use crate::auth::Role;

use super::super::{FileStorage, StorageError, StorageResult};

/// Normalize an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

/// User profile stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Normalized email address (unique)
    pub email: String,
    /// bcrypt password hash (never exposed via API)
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// Organization name (issuers typically set this)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Profile returned to API clients (never includes the password hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    pub id: String,
    /// Email address
    pub email: String,
    /// Account role
    pub role: Role,
    /// Organization name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            organization_name: user.organization_name,
            created_at: user.created_at,
        }
    }
}

/// Repository for user profile operations.
pub struct UserRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> bool {
        self.storage.exists(self.storage.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let path = self.storage.paths().user(user_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(path)
    }

    /// Find a user by email (normalized before comparison).
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let needle = normalize_email(email);
        let user_ids = self
            .storage
            .list_files(self.storage.paths().users_dir(), "json")?;

        for id in user_ids {
            if let Ok(user) = self.get(&id) {
                if user.email == needle {
                    return Ok(Some(user));
                }
            }
        }

        Ok(None)
    }

    /// Create a new user profile.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        let user_id = &user.id;

        if self.exists(user_id) {
            return Err(StorageError::AlreadyExists(format!("User {user_id}")));
        }

        self.storage
            .write_json(self.storage.paths().user(user_id), user)
    }

    /// Update an existing user profile.
    pub fn update(&self, user: &StoredUser) -> StorageResult<()> {
        let user_id = &user.id;

        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }

        self.storage
            .write_json(self.storage.paths().user(user_id), user)
    }

    /// Delete a user profile.
    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }

        self.storage.delete(self.storage.paths().user(user_id))
    }

    /// List all users (admin view).
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let user_ids = self
            .storage
            .list_files(self.storage.paths().users_dir(), "json")?;

        let mut users = Vec::new();
        for id in user_ids {
            if let Ok(user) = self.get(&id) {
                users.push(user);
            }
        }

        Ok(users)
    }
}
