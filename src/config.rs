// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! All configuration is loaded from the environment at startup. Values are
//! trimmed; an empty value counts as unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SHOPIFY_ACCESS_TOKEN` | Shopify Admin API access token | Required |
//! | `SHOPIFY_STORE_DOMAIN` | Store host, e.g. `shop.myshopify.com` | Required |
//! | `SHOPIFY_API_VERSION` | Admin REST API version segment | `2024-04` |
//! | `ORDERS_LIMIT` | Page size when listing orders | `50` |
//! | `REQUEST_TIMEOUT_SECS` | Per-request HTTP timeout | `20` |
//! | `CTT_TRACKING_ENDPOINT` | Tracking URL template with `{tracking}` | CTT Express public endpoint |
//! | `CTT_HEADERS_EXTRA` | Extra headers, `Name:Value\|Name:Value` | empty |
//! | `SYNC_INTERVAL_SECS` | Seconds between scheduled sweeps | `600` |
//! | `HOST` | API bind address | `0.0.0.0` |
//! | `PORT` | API bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use crate::error::ConfigError;

/// Public CTT Express tracking endpoint. `{tracking}` is replaced with the
/// shipment tracking number.
const DEFAULT_CTT_TRACKING_ENDPOINT: &str =
    "https://wct.cttexpress.com/p_track_redis.php?sc={tracking}";

const DEFAULT_API_VERSION: &str = "2024-04";
const DEFAULT_ORDERS_LIMIT: u32 = 50;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 600;

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shopify Admin API access token. Never logged.
    pub shopify_access_token: String,
    /// Store host, must be a `myshopify.com` domain.
    pub shopify_store_domain: String,
    /// Admin REST API version path segment.
    pub shopify_api_version: String,
    /// Page size for the orders listing.
    pub orders_limit: u32,
    /// Timeout applied to every outbound HTTP request.
    pub request_timeout: Duration,
    /// CTT tracking URL template containing `{tracking}`.
    pub ctt_tracking_endpoint: String,
    /// Extra headers sent to the CTT endpoint.
    pub ctt_headers_extra: Vec<(String, String)>,
    /// Interval between scheduled sweeps.
    pub sync_interval: Duration,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Collects every missing required variable before failing, so a
    /// misconfigured deployment reports all problems in one run.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut missing = Vec::new();

        let shopify_access_token = match env_optional("SHOPIFY_ACCESS_TOKEN") {
            Some(token) => token,
            None => {
                missing.push("SHOPIFY_ACCESS_TOKEN".to_string());
                String::new()
            }
        };

        let shopify_store_domain = match env_optional("SHOPIFY_STORE_DOMAIN") {
            Some(domain) if domain.contains("myshopify.com") => domain,
            _ => {
                missing.push("SHOPIFY_STORE_DOMAIN (e.g. shop.myshopify.com)".to_string());
                String::new()
            }
        };

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.join(", ")));
        }

        let shopify_api_version = env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION);

        let orders_limit = env_parsed("ORDERS_LIMIT", DEFAULT_ORDERS_LIMIT)?;
        let request_timeout_secs =
            env_parsed("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let sync_interval_secs = env_parsed("SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS)?;

        let ctt_tracking_endpoint =
            env_or_default("CTT_TRACKING_ENDPOINT", DEFAULT_CTT_TRACKING_ENDPOINT);
        if !ctt_tracking_endpoint.contains("{tracking}") {
            return Err(ConfigError::Invalid {
                name: "CTT_TRACKING_ENDPOINT".to_string(),
                reason: "template must contain a {tracking} placeholder".to_string(),
            });
        }

        let ctt_headers_extra =
            parse_extra_headers(&env_optional("CTT_HEADERS_EXTRA").unwrap_or_default());

        Ok(Self {
            shopify_access_token,
            shopify_store_domain,
            shopify_api_version,
            orders_limit,
            request_timeout: Duration::from_secs(request_timeout_secs),
            ctt_tracking_endpoint,
            ctt_headers_extra,
            sync_interval: Duration::from_secs(sync_interval_secs),
        })
    }
}

/// Parse the `CTT_HEADERS_EXTRA` format: `Header1:Value1|Header2:Value2`.
///
/// Entries without a `:` separator are ignored. Names and values are trimmed.
pub fn parse_extra_headers(raw: &str) -> Vec<(String, String)> {
    raw.split('|')
        .filter_map(|part| {
            let (name, value) = part.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env_optional(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            reason: format!("not a valid number: {raw}"),
        }),
        None => Ok(default),
    }
}
