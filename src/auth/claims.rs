// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried in a Signatura session token.
///
/// Tokens are issued by this server (HS256, `JWT_SECRET`) at signup/signin
/// and expire after 24 hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's ID
    pub sub: String,

    /// User's email at issue time
    pub email: String,

    /// User's role at issue time
    pub role: Role,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// Authenticated user information extracted from a session token.
///
/// This is the primary type used throughout the application to represent
/// the authenticated user making a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (token `sub` claim)
    pub user_id: String,

    /// User's email
    pub email: String,

    /// User's role
    pub role: Role,

    /// Token expiration (Unix timestamp, used for validation, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from verified token claims.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            expires_at: claims.exp,
        }
    }

    /// Check if the user has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        Claims {
            sub: "user_123".to_string(),
            email: "issuer@example.com".to_string(),
            role: Role::Issuer,
            iat: 1700000000,
            exp: 1700086400,
        }
    }

    #[test]
    fn from_claims_extracts_identity() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.email, "issuer@example.com");
        assert_eq!(user.role, Role::Issuer);
        assert_eq!(user.expires_at, 1700086400);
    }

    #[test]
    fn has_role_checks_privilege() {
        let user = AuthenticatedUser::from_claims(sample_claims());

        assert!(user.has_role(Role::Issuer));
        assert!(!user.has_role(Role::Admin));
        assert!(!user.has_role(Role::Owner));
        assert!(!user.is_admin());
    }
}
