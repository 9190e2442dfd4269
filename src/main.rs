// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Result};
use clap::Parser;
use kubeop::{
    admission::server::run_admission,
    config::{Cli, Command},
    constants::TOKIO_WORKER_THREADS,
    operator::run_operator,
};
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("kubeop")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Format: timestamp file:line LEVEL message
    // RUST_LOG selects the filter (default info), RUST_LOG_FORMAT=json switches
    // to JSON lines.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    // Shared by the kube client, reqwest and the webhook listener
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install the rustls crypto provider"))?;

    debug!("Logging initialized with file and line number tracking");

    match cli.command {
        Command::Operator(args) => {
            info!(version = env!("CARGO_PKG_VERSION"), "Starting kubeop operator");
            run_operator(args).await
        }
        Command::Admission(args) => {
            info!(version = env!("CARGO_PKG_VERSION"), "Starting kubeop admission webhook");
            run_admission(args).await
        }
    }
}
