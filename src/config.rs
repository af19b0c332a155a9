// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for record storage | `data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HS256 secret for session tokens | Required for production |
//! | `FRONTEND_URL` | Allowed CORS origin | Permissive CORS when unset |
//! | `TLS_CERT_PATH` | PEM certificate chain for HTTPS | Plain HTTP when unset |
//! | `TLS_KEY_PATH` | PEM private key for HTTPS | Plain HTTP when unset |
//! | `SEED_ADMIN_EMAIL` | Bootstrap admin account email | No account seeded |
//! | `SEED_ADMIN_PASSWORD` | Bootstrap admin account password | No account seeded |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the record storage directory path.
///
/// All user profiles, documents, verification requests, revocations, and
/// audit logs are stored here as JSON files.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the HS256 session token secret.
///
/// When unset the server falls back to a development-only secret and logs a
/// warning. Never deploy without setting this.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable name for the allowed CORS origin.
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";

/// Environment variable name for the TLS certificate chain (PEM).
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";

/// Environment variable name for the TLS private key (PEM).
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Environment variable names for the bootstrap admin account.
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Development-only fallback for [`JWT_SECRET_ENV`].
pub const DEV_JWT_SECRET: &str = "signatura-dev-secret";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;
