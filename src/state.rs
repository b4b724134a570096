// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::service::SyncService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SyncService>,
    /// Scheduler interval; the readiness probe uses it to judge staleness.
    pub sync_interval: Duration,
}

impl AppState {
    pub fn new(service: Arc<SyncService>, sync_interval: Duration) -> Self {
        Self {
            service,
            sync_interval,
        }
    }
}
