// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Instant;

use crate::auth::JwtKeys;
use crate::storage::FileStorage;
use crate::tokens::TokenSigner;

/// Authentication context: session token keys and the verification
/// access-token signer, both derived from the shared `JWT_SECRET`.
#[derive(Clone)]
pub struct AuthContext {
    pub keys: JwtKeys,
    pub tokens: TokenSigner,
}

impl AuthContext {
    pub fn new(secret: &str) -> Self {
        Self {
            keys: JwtKeys::new(secret),
            tokens: TokenSigner::new(secret),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub storage: FileStorage,
    pub auth: AuthContext,
    started_at: Instant,
}

impl AppState {
    pub fn new(storage: FileStorage, auth: AuthContext) -> Self {
        Self {
            storage,
            auth,
            started_at: Instant::now(),
        }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Seconds since the state was constructed (server uptime).
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
