// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shopify Admin REST API client, reduced to the order and fulfillment
//! event surface the sync needs.
//!
//! The orders listing follows `Link` header cursor pagination, and every
//! request retries on HTTP 429 honoring `Retry-After`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::models::{
    CreateFulfillmentEventRequest, FulfillmentEvent, FulfillmentEventsResponse, NewFulfillmentEvent,
    Order, OrdersResponse,
};

/// Upper bound on pages followed per orders listing. Bounds worst-case sweep
/// time on stores with deep shipped-order history.
const MAX_ORDER_PAGES: usize = 10;

/// Attempts per request when the API answers 429.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Fallback wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum ShopifyError {
    #[error("Shopify request failed: {0}")]
    Request(String),

    #[error("Shopify returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Shopify response was invalid: {0}")]
    InvalidResponse(String),
}

/// Client for one store's Admin API.
#[derive(Debug, Clone)]
pub struct ShopifyClient {
    base_url: String,
    access_token: String,
    orders_limit: u32,
    http: Client,
}

impl ShopifyClient {
    pub fn from_config(config: &Config) -> Result<Self, ShopifyError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ShopifyError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: format!(
                "https://{}/admin/api/{}",
                config.shopify_store_domain.trim_end_matches('/'),
                config.shopify_api_version
            ),
            access_token: config.shopify_access_token.clone(),
            orders_limit: config.orders_limit,
            http,
        })
    }

    /// List recent orders whose fulfillment status is `shipped`, following
    /// cursor pagination up to [`MAX_ORDER_PAGES`] pages.
    pub async fn list_shipped_orders(&self) -> Result<Vec<Order>, ShopifyError> {
        let limit = self.orders_limit.to_string();
        let first_page = [
            ("status", "any"),
            ("fulfillment_status", "shipped"),
            ("limit", limit.as_str()),
            ("order", "created_at desc"),
        ];

        let mut orders = Vec::new();
        let mut next_url: Option<String> = None;

        for page in 0..MAX_ORDER_PAGES {
            let request = match &next_url {
                // Cursor pages must not repeat the filter params; the cursor
                // link already encodes them.
                Some(url) => self.http.get(url),
                None => self
                    .http
                    .get(format!("{}/orders.json", self.base_url))
                    .query(&first_page),
            };

            let response = self.send_with_retry(request).await?;
            let link_header = response
                .headers()
                .get("link")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body: OrdersResponse = decode_json(response).await?;
            debug!(page, count = body.orders.len(), "Shopify orders page fetched");
            orders.extend(body.orders);

            next_url = link_header.as_deref().and_then(parse_next_page_url);
            if next_url.is_none() {
                break;
            }
        }

        Ok(orders)
    }

    /// List the existing fulfillment events of one fulfillment.
    pub async fn list_fulfillment_events(
        &self,
        order_id: i64,
        fulfillment_id: i64,
    ) -> Result<Vec<FulfillmentEvent>, ShopifyError> {
        let url = format!(
            "{}/orders/{order_id}/fulfillments/{fulfillment_id}/events.json",
            self.base_url
        );
        let response = self.send_with_retry(self.http.get(url)).await?;
        let body: FulfillmentEventsResponse = decode_json(response).await?;
        Ok(body.fulfillment_events.unwrap_or_default())
    }

    /// Create a fulfillment event on a fulfillment.
    pub async fn create_fulfillment_event(
        &self,
        order_id: i64,
        fulfillment_id: i64,
        event: NewFulfillmentEvent,
    ) -> Result<(), ShopifyError> {
        let url = format!(
            "{}/orders/{order_id}/fulfillments/{fulfillment_id}/events.json",
            self.base_url
        );
        let body = CreateFulfillmentEventRequest {
            fulfillment_event: event,
        };
        self.send_with_retry(self.http.post(url).json(&body))
            .await?;
        Ok(())
    }

    /// Send a request, retrying on 429 with the server-suggested delay.
    ///
    /// Any other non-success status is returned as [`ShopifyError::Api`].
    async fn send_with_retry(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ShopifyError> {
        // `.json()` already sets Content-Type on bodied requests.
        let request = request
            .header("X-Shopify-Access-Token", &self.access_token)
            .header("Accept", "application/json");

        let mut attempt = 0;
        loop {
            let cloned = request.try_clone().ok_or_else(|| {
                ShopifyError::Request("request body is not cloneable for retry".to_string())
            })?;

            let response = cloned
                .send()
                .await
                .map_err(|e| ShopifyError::Request(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RATE_LIMIT_RETRIES {
                let wait = retry_after(&response).unwrap_or(DEFAULT_RETRY_AFTER);
                attempt += 1;
                debug!(
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "Shopify rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Api { status, body });
        }
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ShopifyError> {
    response
        .json()
        .await
        .map_err(|e| ShopifyError::InvalidResponse(e.to_string()))
}

/// Parse the `Retry-After` header. Shopify sends fractional seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    let secs: f64 = response
        .headers()
        .get("retry-after")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

/// Extract the `rel="next"` URL from a `Link` response header.
///
/// Header shape: `<https://...page_info=abc>; rel="previous", <https://...>; rel="next"`.
pub fn parse_next_page_url(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let part = part.trim();
        if !part.contains(r#"rel="next""#) {
            continue;
        }
        let start = part.find('<')?;
        let end = part.find('>')?;
        if start + 1 < end {
            return Some(part[start + 1..end].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_url_parses_next_relation() {
        let header = r#"<https://shop.myshopify.com/admin/api/2024-04/orders.json?page_info=abc&limit=50>; rel="next""#;
        assert_eq!(
            parse_next_page_url(header).as_deref(),
            Some("https://shop.myshopify.com/admin/api/2024-04/orders.json?page_info=abc&limit=50")
        );
    }

    #[test]
    fn next_page_url_skips_previous_relation() {
        let header = r#"<https://shop.myshopify.com/x?page_info=prev>; rel="previous", <https://shop.myshopify.com/x?page_info=next>; rel="next""#;
        assert_eq!(
            parse_next_page_url(header).as_deref(),
            Some("https://shop.myshopify.com/x?page_info=next")
        );
    }

    #[test]
    fn next_page_url_none_when_only_previous() {
        let header = r#"<https://shop.myshopify.com/x?page_info=prev>; rel="previous""#;
        assert_eq!(parse_next_page_url(header), None);
    }

    #[test]
    fn next_page_url_none_for_malformed_header() {
        assert_eq!(parse_next_page_url("garbage"), None);
        assert_eq!(parse_next_page_url(r#"no-brackets; rel="next""#), None);
    }
}
