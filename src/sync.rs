// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sync Engine
//!
//! One sweep walks every shipped order's fulfillments, asks CTT for the
//! latest shipment event, and creates the matching Shopify fulfillment
//! event. Idempotency rules:
//!
//! - a fulfillment with an existing `delivered` event is terminal and is
//!   never touched again;
//! - an event with the same mapped status is never created twice;
//! - an unmappable carrier text creates no event.
//!
//! Per-fulfillment provider failures are counted and logged but do not
//! abort the sweep; only failing to list orders at all does.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SyncError;
use crate::mapping::{map_carrier_status, EventStatus};
use crate::models::{FulfillmentEvent, NewFulfillmentEvent, SweepReport, TrackingSnapshot};
use crate::providers::{ctt::CttClient, shopify::ShopifyClient};

/// What the sync decided to do with one fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Create(EventStatus),
    SkipDelivered,
    SkipDuplicate(EventStatus),
    SkipUnmapped,
}

/// Apply the idempotency rules to one fulfillment's existing events and the
/// mapped carrier status.
pub fn decide(existing: &[FulfillmentEvent], mapped: Option<EventStatus>) -> Decision {
    if existing
        .iter()
        .any(|event| event.status_is(EventStatus::Delivered))
    {
        return Decision::SkipDelivered;
    }

    match mapped {
        None => Decision::SkipUnmapped,
        Some(status) if existing.iter().any(|event| event.status_is(status)) => {
            Decision::SkipDuplicate(status)
        }
        Some(status) => Decision::Create(status),
    }
}

/// Parse a CTT event timestamp into UTC.
///
/// Accepts RFC 3339 (with `Z` or an offset) and naive `YYYY-MM-DDTHH:MM:SS`
/// or space-separated timestamps, which are assumed UTC. Unparseable input
/// yields `None` and the event is created without `happened_at`.
pub fn parse_event_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

/// Build the event to create from a carrier snapshot. The carrier text is
/// preserved verbatim in the event message.
pub fn build_event(snapshot: &TrackingSnapshot, status: EventStatus) -> NewFulfillmentEvent {
    NewFulfillmentEvent {
        status,
        message: format!("CTT: {}", snapshot.description),
        happened_at: snapshot
            .event_date
            .as_deref()
            .and_then(parse_event_timestamp),
    }
}

/// Orchestrates sweeps over both provider clients.
pub struct SyncEngine {
    shopify: ShopifyClient,
    ctt: CttClient,
}

impl SyncEngine {
    pub fn new(shopify: ShopifyClient, ctt: CttClient) -> Self {
        Self { shopify, ctt }
    }

    /// Run one full sweep and return its report.
    pub async fn sweep(&self) -> Result<SweepReport, SyncError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let orders = self.shopify.list_shipped_orders().await?;

        let mut report = SweepReport {
            run_id,
            started_at,
            finished_at: started_at,
            orders_scanned: orders.len() as u32,
            fulfillments_checked: 0,
            events_created: 0,
            skipped_delivered: 0,
            skipped_duplicate: 0,
            skipped_unmapped: 0,
            failures: 0,
        };

        for order in &orders {
            for fulfillment in &order.fulfillments {
                let Some(tracking) = fulfillment.tracking_number() else {
                    continue;
                };
                report.fulfillments_checked += 1;

                match self.sync_fulfillment(order.id, fulfillment.id, tracking).await {
                    Ok(Decision::Create(status)) => {
                        report.events_created += 1;
                        info!(
                            order_id = order.id,
                            fulfillment_id = fulfillment.id,
                            status = %status,
                            "Created fulfillment event"
                        );
                    }
                    Ok(Decision::SkipDelivered) => report.skipped_delivered += 1,
                    Ok(Decision::SkipDuplicate(_)) => report.skipped_duplicate += 1,
                    Ok(Decision::SkipUnmapped) => report.skipped_unmapped += 1,
                    Err(e) => {
                        report.failures += 1;
                        warn!(
                            order_id = order.id,
                            fulfillment_id = fulfillment.id,
                            tracking = tracking,
                            error = %e,
                            "Failed to sync fulfillment"
                        );
                    }
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            run_id = %report.run_id,
            orders = report.orders_scanned,
            checked = report.fulfillments_checked,
            created = report.events_created,
            skipped_delivered = report.skipped_delivered,
            skipped_duplicate = report.skipped_duplicate,
            skipped_unmapped = report.skipped_unmapped,
            failures = report.failures,
            "Sweep finished"
        );

        Ok(report)
    }

    /// Sync a single fulfillment: fetch existing events, consult CTT, apply
    /// the decision.
    async fn sync_fulfillment(
        &self,
        order_id: i64,
        fulfillment_id: i64,
        tracking: &str,
    ) -> Result<Decision, SyncError> {
        let existing = self
            .shopify
            .list_fulfillment_events(order_id, fulfillment_id)
            .await?;

        // Terminal fulfillments skip the carrier lookup entirely.
        if existing
            .iter()
            .any(|event| event.status_is(EventStatus::Delivered))
        {
            return Ok(Decision::SkipDelivered);
        }

        let snapshot = self.ctt.track(tracking).await?;
        let mapped = snapshot
            .as_ref()
            .and_then(|s| map_carrier_status(&s.description));

        let decision = decide(&existing, mapped);
        match (decision, &snapshot) {
            // `decide` only returns Create when a snapshot mapped.
            (Decision::Create(status), Some(snapshot)) => {
                self.shopify
                    .create_fulfillment_event(
                        order_id,
                        fulfillment_id,
                        build_event(snapshot, status),
                    )
                    .await?;
            }
            (Decision::SkipUnmapped, Some(snapshot)) => {
                info!(
                    order_id,
                    fulfillment_id,
                    carrier_text = %snapshot.description,
                    "Carrier status not mappable, no event created"
                );
            }
            _ => {}
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(status: &str) -> FulfillmentEvent {
        FulfillmentEvent {
            status: Some(status.to_string()),
            happened_at: None,
            message: None,
        }
    }

    #[test]
    fn decide_creates_for_new_status() {
        let existing = vec![event("confirmed")];
        assert_eq!(
            decide(&existing, Some(EventStatus::InTransit)),
            Decision::Create(EventStatus::InTransit)
        );
    }

    #[test]
    fn decide_skips_terminal_delivered_fulfillment() {
        let existing = vec![event("confirmed"), event("delivered")];
        // Even a new, different status does not touch a delivered fulfillment.
        assert_eq!(
            decide(&existing, Some(EventStatus::Failure)),
            Decision::SkipDelivered
        );
    }

    #[test]
    fn decide_skips_duplicate_status() {
        let existing = vec![event("in_transit")];
        assert_eq!(
            decide(&existing, Some(EventStatus::InTransit)),
            Decision::SkipDuplicate(EventStatus::InTransit)
        );
    }

    #[test]
    fn decide_skips_unmapped_text() {
        assert_eq!(decide(&[], None), Decision::SkipUnmapped);
    }

    #[test]
    fn decide_ignores_whitespace_in_existing_status() {
        let existing = vec![event(" delivered ")];
        assert_eq!(
            decide(&existing, Some(EventStatus::InTransit)),
            Decision::SkipDelivered
        );
    }

    #[test]
    fn timestamp_parses_rfc3339_with_zulu() {
        let parsed = parse_event_timestamp("2024-05-02T10:15:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 2, 10, 15, 0).unwrap());
    }

    #[test]
    fn timestamp_converts_offsets_to_utc() {
        let parsed = parse_event_timestamp("2024-05-02T12:15:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 2, 10, 15, 0).unwrap());
    }

    #[test]
    fn timestamp_assumes_utc_for_naive_input() {
        let parsed = parse_event_timestamp("2024-05-02 10:15:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 2, 10, 15, 0).unwrap());
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert_eq!(parse_event_timestamp("yesterday-ish"), None);
        assert_eq!(parse_event_timestamp(""), None);
    }

    #[test]
    fn built_event_preserves_carrier_text_and_timestamp() {
        let snapshot = TrackingSnapshot {
            description: "En tránsito".to_string(),
            event_date: Some("2024-05-02T10:15:00Z".to_string()),
        };
        let built = build_event(&snapshot, EventStatus::InTransit);
        assert_eq!(built.message, "CTT: En tránsito");
        assert_eq!(built.status, EventStatus::InTransit);
        assert_eq!(
            built.happened_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 10, 15, 0).unwrap())
        );
    }

    #[test]
    fn built_event_drops_unparseable_timestamp() {
        let snapshot = TrackingSnapshot {
            description: "Entregado".to_string(),
            event_date: Some("soon".to_string()),
        };
        let built = build_event(&snapshot, EventStatus::Delivered);
        assert_eq!(built.happened_at, None);
    }
}
