// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP listener bootstrap shared by both processes.

use anyhow::{Context as _, Result};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Grace period for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Where the serving certificate and key come from.
#[derive(Clone, Debug)]
pub enum TlsSource {
    /// PEM files on disk
    Files { cert: PathBuf, key: PathBuf },
    /// PEM material held in memory
    Pem { cert: Vec<u8>, key: Vec<u8> },
}

impl TlsSource {
    async fn load(self) -> Result<RustlsConfig> {
        match self {
            TlsSource::Files { cert, key } => RustlsConfig::from_pem_file(&cert, &key)
                .await
                .with_context(|| format!("loading TLS material from {}", cert.display())),
            TlsSource::Pem { cert, key } => RustlsConfig::from_pem(cert, key)
                .await
                .context("loading in-memory TLS material"),
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Serve `app` on `addr` until a shutdown signal, over TLS when `tls` is set.
///
/// # Errors
///
/// Returns an error if the certificate cannot be loaded or the listener fails.
pub async fn serve(app: Router, addr: SocketAddr, tls: Option<TlsSource>) -> Result<()> {
    match tls {
        Some(source) => {
            let config = source.load().await?;
            let handle = axum_server::Handle::new();
            let shutdown = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            info!(addr = %addr, "Starting HTTPS listener");
            axum_server::bind_rustls(addr, config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!(addr = %addr, "Starting HTTP listener");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }
    Ok(())
}
