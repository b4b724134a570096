// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Wire types for the two provider APIs plus the sweep report returned by
//! the sync API. All provider types tolerate unknown fields; both Shopify
//! and CTT payloads carry far more than this service reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::mapping::EventStatus;

// =============================================================================
// Shopify Order Models
// =============================================================================

/// Envelope of `GET /orders.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// A Shopify order, reduced to the fields the sync reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human-facing order name, e.g. `#1042`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fulfillments: Vec<Fulfillment>,
}

/// A fulfillment attached to an order.
#[derive(Debug, Clone, Deserialize)]
pub struct Fulfillment {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_numbers: Vec<String>,
}

impl Fulfillment {
    /// Resolve the tracking number: the singular field wins, otherwise the
    /// first entry of the plural one.
    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                self.tracking_numbers
                    .iter()
                    .map(String::as_str)
                    .find(|t| !t.trim().is_empty())
            })
    }
}

// =============================================================================
// Shopify Fulfillment Event Models
// =============================================================================

/// Envelope of `GET /orders/{o}/fulfillments/{f}/events.json`.
///
/// Shopify can return `"fulfillment_events": null`, so the field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentEventsResponse {
    #[serde(default)]
    pub fulfillment_events: Option<Vec<FulfillmentEvent>>,
}

/// An existing fulfillment event on a Shopify order.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentEvent {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub happened_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FulfillmentEvent {
    pub fn status_is(&self, status: EventStatus) -> bool {
        self.status
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| s == status.as_str())
    }
}

/// Body of `POST /orders/{o}/fulfillments/{f}/events.json`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateFulfillmentEventRequest {
    pub fulfillment_event: NewFulfillmentEvent,
}

/// The event payload inside [`CreateFulfillmentEventRequest`].
#[derive(Debug, Clone, Serialize)]
pub struct NewFulfillmentEvent {
    pub status: EventStatus,
    /// Carrier text is preserved verbatim, prefixed with `CTT: `.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happened_at: Option<DateTime<Utc>>,
}

// =============================================================================
// CTT Tracking Models
// =============================================================================

/// Latest shipment state reported by the CTT tracking endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSnapshot {
    /// Free-text description of the most recent shipping event.
    pub description: String,
    /// Raw event timestamp as reported by CTT, when present.
    pub event_date: Option<String>,
}

// =============================================================================
// Sweep Report
// =============================================================================

/// Outcome of one sync sweep, kept for the status endpoint and logged after
/// every run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepReport {
    /// Unique id of this sweep run.
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Orders returned by the shipped-orders listing.
    pub orders_scanned: u32,
    /// Fulfillments that had a usable tracking number.
    pub fulfillments_checked: u32,
    /// Fulfillment events created on Shopify.
    pub events_created: u32,
    /// Fulfillments left alone because a `delivered` event already exists.
    pub skipped_delivered: u32,
    /// Fulfillments whose mapped status was already present.
    pub skipped_duplicate: u32,
    /// Fulfillments whose carrier text mapped to no event status.
    pub skipped_unmapped: u32,
    /// Per-fulfillment provider failures (sweep continued past them).
    pub failures: u32,
}
