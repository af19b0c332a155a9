// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TLS configuration.
//!
//! HTTPS is enabled when both `TLS_CERT_PATH` and `TLS_KEY_PATH` point at
//! PEM files; otherwise the server binds plain HTTP (for deployment behind
//! a terminating proxy).

use std::env;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::{TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV};

/// Load the rustls config from the environment, if TLS is configured.
///
/// Returns `None` when neither path is set. A half-configured setup (one
/// of the two variables, or unloadable files) aborts startup rather than
/// silently falling back to plain HTTP.
pub async fn load_tls_config() -> Option<RustlsConfig> {
    let cert_path = env::var(TLS_CERT_PATH_ENV).ok();
    let key_path = env::var(TLS_KEY_PATH_ENV).ok();

    match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => {
            let config = RustlsConfig::from_pem_file(&cert_path, &key_path)
                .await
                .expect("Failed to load TLS certificate/key");
            Some(config)
        }
        (None, None) => None,
        _ => panic!("TLS_CERT_PATH and TLS_KEY_PATH must both be set to enable TLS"),
    }
}
