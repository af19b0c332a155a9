// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr, time::Duration};

use axum_server::Handle;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use signatura_server::api::router;
use signatura_server::auth::{password, Role};
use signatura_server::config::{
    DATA_DIR_ENV, DEFAULT_PORT, DEV_JWT_SECRET, HOST_ENV, JWT_SECRET_ENV, LOG_FORMAT_ENV,
    PORT_ENV, SEED_ADMIN_EMAIL_ENV, SEED_ADMIN_PASSWORD_ENV,
};
use signatura_server::expiry::ExpirySweeper;
use signatura_server::state::{AppState, AuthContext};
use signatura_server::storage::{normalize_email, FileStorage, StoragePaths, StoredUser, UserRepository};
use signatura_server::tls::load_tls_config;

#[tokio::main]
async fn main() {
    init_tracing();

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize record storage
    let paths = match env::var(DATA_DIR_ENV) {
        Ok(dir) => StoragePaths::new(dir),
        Err(_) => StoragePaths::default(),
    };
    let mut storage = FileStorage::new(paths);
    storage
        .initialize()
        .expect("Failed to initialize record storage");
    info!(data_dir = %storage.paths().root().display(), "Record storage initialized");

    // Session token secret
    let secret = env::var(JWT_SECRET_ENV).unwrap_or_else(|_| {
        warn!("JWT_SECRET not set; using the development secret. Do NOT deploy like this.");
        DEV_JWT_SECRET.to_string()
    });

    seed_admin_account(&storage);

    let state = AppState::new(storage.clone(), AuthContext::new(&secret));
    let app = router(state);

    // Background expiry sweeper with graceful shutdown
    let shutdown = CancellationToken::new();
    tokio::spawn(ExpirySweeper::new(storage).run(shutdown.clone()));

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), shutdown));

    // Parse bind address
    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| DEFAULT_PORT.to_string())
        .parse()
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    match load_tls_config().await {
        Some(tls_config) => {
            info!("Signatura server listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            info!("Signatura server listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }
}

/// Initialize the tracing subscriber (`LOG_FORMAT=json` for JSON output).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Create the bootstrap admin account when `SEED_ADMIN_EMAIL` and
/// `SEED_ADMIN_PASSWORD` are set and the account does not exist yet.
fn seed_admin_account(storage: &FileStorage) {
    let (Ok(email), Ok(seed_password)) = (
        env::var(SEED_ADMIN_EMAIL_ENV),
        env::var(SEED_ADMIN_PASSWORD_ENV),
    ) else {
        return;
    };

    let users = UserRepository::new(storage);
    let email = normalize_email(&email);
    match users.find_by_email(&email) {
        Ok(Some(_)) => {
            info!(%email, "Seed admin account already exists");
        }
        Ok(None) => {
            let password_hash =
                password::hash_password(&seed_password).expect("Failed to hash seed admin password");
            let user = StoredUser {
                id: Uuid::new_v4().to_string(),
                email: email.clone(),
                password_hash,
                role: Role::Admin,
                organization_name: None,
                created_at: Utc::now(),
            };
            users.create(&user).expect("Failed to create seed admin account");
            info!(%email, "Seed admin account created");
        }
        Err(e) => {
            warn!(error = %e, "Failed to look up seed admin account");
        }
    }
}

/// Wait for ctrl-c or SIGTERM, then stop the sweeper and drain the server.
async fn shutdown_signal(handle: Handle<SocketAddr>, shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
    shutdown.cancel();
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
