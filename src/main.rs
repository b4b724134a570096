// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr, sync::Arc};

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relational_shipping_sync::api;
use relational_shipping_sync::config::Config;
use relational_shipping_sync::poller::SyncPoller;
use relational_shipping_sync::providers::{ctt::CttClient, shopify::ShopifyClient};
use relational_shipping_sync::service::SyncService;
use relational_shipping_sync::state::AppState;
use relational_shipping_sync::sync::SyncEngine;

#[derive(Parser)]
#[command(
    name = "shipping-sync",
    version,
    about = "Syncs CTT Express shipment tracking into Shopify fulfillment events"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interval scheduler plus the dispatch API (default).
    Serve,
    /// Run a single sweep and exit. Exits non-zero when the sweep fails.
    Once,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    let shopify = ShopifyClient::from_config(&config).expect("Failed to build Shopify client");
    let ctt = CttClient::from_config(&config).expect("Failed to build CTT client");
    let service = Arc::new(SyncService::new(SyncEngine::new(shopify, ctt)));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Once => run_once(service).await,
        Command::Serve => serve(config, service).await,
    }
}

/// One-shot mode for cron-style invocation: a failed sweep fails the run.
async fn run_once(service: Arc<SyncService>) {
    match service.run_sweep().await {
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                created = report.events_created,
                failures = report.failures,
                "One-shot sweep finished"
            );
        }
        Err(e) => {
            error!(error = %e, "Sweep failed");
            std::process::exit(1);
        }
    }
}

async fn serve(config: Config, service: Arc<SyncService>) {
    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let poller = SyncPoller::new(Arc::clone(&service), config.sync_interval);
    let poller_handle = tokio::spawn(poller.run(shutdown.clone()));

    let state = AppState::new(service, config.sync_interval);
    let app = api::router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind API address");

    println!("Shipping sync listening on http://{addr} (docs at /docs)");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await
        .expect("HTTP server failed");

    // Let the poller observe the cancellation before exiting.
    shutdown.cancel();
    let _ = poller_handle.await;
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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

    info!("Shutdown signal received");
    token.cancel();
}
