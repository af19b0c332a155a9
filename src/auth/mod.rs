// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides email/password authentication and session tokens for
//! the Signatura API.
//!
//! ## Auth Flow
//!
//! 1. `POST /v1/auth/signup` validates the email and password, bcrypt-hashes
//!    the password, stores a role-tagged profile, and issues a session token
//! 2. `POST /v1/auth/signin` verifies the password against the stored hash
//!    and issues a fresh token
//! 3. Clients send `Authorization: Bearer <token>` on every request; the
//!    `Auth` extractor verifies the signature and expiry and exposes the
//!    user's identity and role to handlers
//!
//! ## Security
//!
//! - Tokens are HS256-signed with a server-local secret and expire after 24 hours
//! - Clock skew tolerance is 60 seconds
//! - Signin failures are indistinguishable (unknown email vs. wrong password)

pub mod claims;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod password;
pub mod roles;

pub use claims::{AuthenticatedUser, Claims};
pub use error::AuthError;
pub use extractor::{bearer_token, AdminOnly, Auth, IssuerOnly};
pub use keys::JwtKeys;
pub use roles::Role;
