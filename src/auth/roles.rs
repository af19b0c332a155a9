// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Aggregate visibility and override powers (delete user, revoke any document)
/// - `Issuer` - Creates documents and can revoke documents it issued
/// - `Owner` - Holds documents in a wallet and decides verification requests
///
/// Verifiers are not a login role: verification endpoints are public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Issues and revokes documents
    Issuer,
    /// Holds documents, approves/denies verification requests
    Owner,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            // Admin can do anything
            (Role::Admin, _) => true,
            (Role::Issuer, Role::Issuer) => true,
            (Role::Owner, Role::Owner) => true,
            // Everything else is denied
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "issuer" => Some(Role::Issuer),
            "owner" => Some(Role::Owner),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Issuer => write!(f, "issuer"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Issuer));
        assert!(Role::Admin.has_privilege(Role::Owner));
    }

    #[test]
    fn issuer_only_has_issuer_privilege() {
        assert!(!Role::Issuer.has_privilege(Role::Admin));
        assert!(Role::Issuer.has_privilege(Role::Issuer));
        assert!(!Role::Issuer.has_privilege(Role::Owner));
    }

    #[test]
    fn owner_only_has_owner_privilege() {
        assert!(!Role::Owner.has_privilege(Role::Admin));
        assert!(!Role::Owner.has_privilege(Role::Issuer));
        assert!(Role::Owner.has_privilege(Role::Owner));
    }

    #[test]
    fn from_str_parses_correctly() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_str("Issuer"), Some(Role::Issuer));
        assert_eq!(Role::from_str("owner"), Some(Role::Owner));
        assert_eq!(Role::from_str("verifier"), None);
    }

    #[test]
    fn serde_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Issuer).unwrap(), r#""issuer""#);
        let parsed: Role = serde_json::from_str(r#""owner""#).unwrap();
        assert_eq!(parsed, Role::Owner);
    }
}
