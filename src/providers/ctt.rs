// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CTT Express tracking client.
//!
//! The public endpoint (`p_track_redis.php?sc={tracking}`) returns the full
//! shipping history of a shipment; only the last event matters here. Some
//! deployments sit behind extra auth headers or cookies, hence the
//! configurable header list.

use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::models::TrackingSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum CttError {
    #[error("CTT request failed: {0}")]
    Request(String),

    #[error("CTT returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("CTT response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct CttClient {
    endpoint_template: String,
    extra_headers: Vec<(String, String)>,
    http: Client,
}

impl CttClient {
    pub fn from_config(config: &Config) -> Result<Self, CttError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CttError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint_template: config.ctt_tracking_endpoint.clone(),
            extra_headers: config.ctt_headers_extra.clone(),
            http,
        })
    }

    /// Fetch the latest shipping event for a tracking number.
    ///
    /// Returns `Ok(None)` when the shipment has no history yet or the last
    /// event carries no description; the sync creates no event then.
    pub async fn track(
        &self,
        tracking_number: &str,
    ) -> Result<Option<TrackingSnapshot>, CttError> {
        let endpoint = build_endpoint(&self.endpoint_template, tracking_number);

        let mut request = self.http.get(&endpoint).header("Accept", "application/json");
        for (name, value) in &self.extra_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CttError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CttError::Api { status, body });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| CttError::InvalidResponse(e.to_string()))?;

        Ok(latest_event(&payload))
    }
}

/// Substitute the tracking number into the endpoint template, URL-encoded.
fn build_endpoint(template: &str, tracking_number: &str) -> String {
    let encoded: String =
        url::form_urlencoded::byte_serialize(tracking_number.trim().as_bytes()).collect();
    template.replace("{tracking}", &encoded)
}

/// Pull the last event out of `data.shipping_history.events`.
fn latest_event(payload: &Value) -> Option<TrackingSnapshot> {
    let events = payload
        .pointer("/data/shipping_history/events")
        .and_then(Value::as_array)?;

    let last = events.last()?;
    let description = last
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if description.is_empty() {
        return None;
    }

    Some(TrackingSnapshot {
        description: description.to_string(),
        event_date: last
            .get("event_date")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_substitutes_and_encodes_tracking_number() {
        let url = build_endpoint(
            "https://wct.cttexpress.com/p_track_redis.php?sc={tracking}",
            " CTT123/456 ",
        );
        assert_eq!(
            url,
            "https://wct.cttexpress.com/p_track_redis.php?sc=CTT123%2F456"
        );
    }

    #[test]
    fn latest_event_reads_last_history_entry() {
        let payload = json!({
            "data": {
                "shipping_history": {
                    "events": [
                        { "description": "Admitido", "event_date": "2024-05-01T08:00:00Z" },
                        { "description": "En tránsito", "event_date": "2024-05-02T10:15:00Z" }
                    ]
                }
            }
        });
        assert_eq!(
            latest_event(&payload),
            Some(TrackingSnapshot {
                description: "En tránsito".to_string(),
                event_date: Some("2024-05-02T10:15:00Z".to_string()),
            })
        );
    }

    #[test]
    fn latest_event_none_for_empty_history() {
        let payload = json!({ "data": { "shipping_history": { "events": [] } } });
        assert_eq!(latest_event(&payload), None);
    }

    #[test]
    fn latest_event_none_when_history_is_missing() {
        assert_eq!(latest_event(&json!({ "data": {} })), None);
        assert_eq!(latest_event(&json!({})), None);
    }

    #[test]
    fn latest_event_none_when_description_is_blank() {
        let payload = json!({
            "data": { "shipping_history": { "events": [
                { "description": "   ", "event_date": "2024-05-02T10:15:00Z" }
            ] } }
        });
        assert_eq!(latest_event(&payload), None);
    }

    #[test]
    fn latest_event_tolerates_missing_event_date() {
        let payload = json!({
            "data": { "shipping_history": { "events": [
                { "description": "Entregado" }
            ] } }
        });
        let snapshot = latest_event(&payload).unwrap();
        assert_eq!(snapshot.description, "Entregado");
        assert_eq!(snapshot.event_date, None);
    }
}
