// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sync Poller
//!
//! Background task that fires a sweep on a fixed interval (default 600 s),
//! replacing the operator having to trigger runs by hand. Sweeps share the
//! run guard in [`SyncService`], so a scheduled sweep waits for a manual
//! one to finish instead of overlapping it.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::service::SyncService;

/// Background sweep scheduler.
pub struct SyncPoller {
    service: Arc<SyncService>,
    interval: Duration,
}

impl SyncPoller {
    pub fn new(service: Arc<SyncService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Sync poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Sync poller shutting down");
                return;
            }

            self.poll_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Sync poller shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one scheduled sweep. The engine logs the per-run summary.
    async fn poll_step(&self) {
        if let Err(e) = self.service.run_sweep().await {
            warn!(error = %e, "Scheduled sweep failed, will retry next interval");
        }
    }
}
