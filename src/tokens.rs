// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification access tokens.
//!
//! When an owner approves a verification request, the API mints an opaque
//! token the verifier can redeem at `GET /v1/verify/access/{token}`.
//!
//! Format: `base64url(request_id) "." base64url(tag)` where
//! `tag = HMAC-SHA256(key, request_id ":" token_expires_at_unix)`.
//!
//! The expiry timestamp is part of the MAC input, so a token is bound to a
//! single approval: re-approving after expiry changes `token_expires_at`
//! and mints a different token, and the old one stops verifying.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Domain separation prefix for key derivation (the same secret also signs
/// session JWTs).
const KEY_CONTEXT: &[u8] = b"signatura-access-token:";

/// Errors from parsing an access token.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessTokenError {
    #[error("Access token is malformed")]
    Malformed,
}

/// A parsed (but not yet authenticated) access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The verification request this token claims to grant.
    pub request_id: String,
    tag: Vec<u8>,
}

impl AccessToken {
    /// Parse the wire form. The tag is NOT checked here; call
    /// [`TokenSigner::verify`] with the stored expiry.
    pub fn parse(token: &str) -> Result<Self, AccessTokenError> {
        let (id_part, tag_part) = token.split_once('.').ok_or(AccessTokenError::Malformed)?;

        let id_bytes =
            Base64UrlUnpadded::decode_vec(id_part).map_err(|_| AccessTokenError::Malformed)?;
        let request_id =
            String::from_utf8(id_bytes).map_err(|_| AccessTokenError::Malformed)?;
        let tag =
            Base64UrlUnpadded::decode_vec(tag_part).map_err(|_| AccessTokenError::Malformed)?;

        Ok(Self { request_id, tag })
    }
}

/// Mints and verifies access tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: [u8; 32],
}

impl TokenSigner {
    /// Derive the token key from the shared application secret.
    pub fn new(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(KEY_CONTEXT);
        hasher.update(secret.as_bytes());
        Self {
            key: hasher.finalize().into(),
        }
    }

    fn mac(&self, request_id: &str, expires_at: DateTime<Utc>) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(request_id.as_bytes());
        mac.update(b":");
        mac.update(expires_at.timestamp().to_string().as_bytes());
        mac
    }

    /// Mint a token for an approved request.
    pub fn mint(&self, request_id: &str, expires_at: DateTime<Utc>) -> String {
        let tag = self.mac(request_id, expires_at).finalize().into_bytes();
        format!(
            "{}.{}",
            Base64UrlUnpadded::encode_string(request_id.as_bytes()),
            Base64UrlUnpadded::encode_string(tag.as_slice())
        )
    }

    /// Verify a parsed token against the expiry stored on the request.
    /// Constant-time tag comparison.
    pub fn verify(&self, token: &AccessToken, expires_at: DateTime<Utc>) -> bool {
        self.mac(&token.request_id, expires_at)
            .verify_slice(&token.tag)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_parse_verify_round_trip() {
        let signer = TokenSigner::new("test-secret");
        let expires = Utc::now() + chrono::Duration::hours(24);

        let token = signer.mint("vr-123", expires);
        let parsed = AccessToken::parse(&token).unwrap();

        assert_eq!(parsed.request_id, "vr-123");
        assert!(signer.verify(&parsed, expires));
    }

    #[test]
    fn tampered_request_id_fails() {
        let signer = TokenSigner::new("test-secret");
        let expires = Utc::now() + chrono::Duration::hours(24);

        let token = signer.mint("vr-123", expires);
        let tag_part = token.split_once('.').unwrap().1;
        let forged = format!(
            "{}.{}",
            Base64UrlUnpadded::encode_string(b"vr-456"),
            tag_part
        );

        let parsed = AccessToken::parse(&forged).unwrap();
        assert!(!signer.verify(&parsed, expires));
    }

    #[test]
    fn different_expiry_invalidates_token() {
        let signer = TokenSigner::new("test-secret");
        let first_expiry = Utc::now() + chrono::Duration::hours(24);
        let second_expiry = first_expiry + chrono::Duration::hours(24);

        let token = signer.mint("vr-123", first_expiry);
        let parsed = AccessToken::parse(&token).unwrap();

        // Request re-approved later: stored expiry changed, old token dies
        assert!(!signer.verify(&parsed, second_expiry));
    }

    #[test]
    fn wrong_secret_fails() {
        let signer = TokenSigner::new("test-secret");
        let other = TokenSigner::new("other-secret");
        let expires = Utc::now() + chrono::Duration::hours(24);

        let token = signer.mint("vr-123", expires);
        let parsed = AccessToken::parse(&token).unwrap();
        assert!(!other.verify(&parsed, expires));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(matches!(
            AccessToken::parse("no-dot"),
            Err(AccessTokenError::Malformed)
        ));
        assert!(matches!(
            AccessToken::parse("!!!.###"),
            Err(AccessTokenError::Malformed)
        ));
        assert!(AccessToken::parse("").is_err());
    }
}
