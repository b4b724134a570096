// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared sweep coordinator.
//!
//! Both the scheduler and the manual dispatch endpoint run sweeps through
//! this service. A run guard serializes sweeps: the scheduler waits for its
//! turn, while a manual dispatch that would overlap is rejected as busy.
//! The most recent report is retained for the status endpoint.

use tokio::sync::{Mutex, RwLock};

use crate::error::SyncError;
use crate::models::SweepReport;
use crate::sync::SyncEngine;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("a sweep is already running")]
    Busy,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub struct SyncService {
    engine: SyncEngine,
    running: Mutex<()>,
    last_report: RwLock<Option<SweepReport>>,
}

impl SyncService {
    pub fn new(engine: SyncEngine) -> Self {
        Self {
            engine,
            running: Mutex::new(()),
            last_report: RwLock::new(None),
        }
    }

    /// Run a sweep, waiting for any in-flight sweep to finish first.
    pub async fn run_sweep(&self) -> Result<SweepReport, SyncError> {
        let _guard = self.running.lock().await;
        self.run_locked().await
    }

    /// Run a sweep only if none is in flight; used by the dispatch endpoint.
    pub async fn try_run_sweep(&self) -> Result<SweepReport, DispatchError> {
        let _guard = self.running.try_lock().map_err(|_| DispatchError::Busy)?;
        Ok(self.run_locked().await?)
    }

    /// The most recent completed sweep report, if any.
    pub async fn last_report(&self) -> Option<SweepReport> {
        self.last_report.read().await.clone()
    }

    async fn run_locked(&self) -> Result<SweepReport, SyncError> {
        let report = self.engine.sweep().await?;
        *self.last_report.write().await = Some(report.clone());
        Ok(report)
    }
}
