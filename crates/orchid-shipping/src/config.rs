//! Per-provider endpoint configuration.
//!
//! Each carrier has four named slots: `<PREFIX>_TRACK_URL` (template with a
//! `{tracking}` token), `<PREFIX>_TRACK_METHOD`, `<PREFIX>_TRACK_HEADERS`
//! (JSON object) and `<PREFIX>_TRACK_BODY` (template). Slots are read once at
//! startup into typed records; a missing URL means the provider is mocked,
//! never a hard failure.

use std::collections::HashMap;

use reqwest::Method;

use crate::carrier::Carrier;

/// Token substituted with the (encoded) tracking number in URL and body
/// templates.
pub const TRACKING_TOKEN: &str = "{tracking}";

/// A fully resolved outbound endpoint for one carrier.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub url_template: String,
    pub method: Method,
    /// Static headers from the `<PREFIX>_TRACK_HEADERS` slot.
    pub headers: Vec<(String, String)>,
    pub body_template: Option<String>,
}

/// What the dispatcher does when a provider request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Answer with a placeholder event and a warning (default).
    MockOnError,
    /// Surface the provider failure to the client as a gateway error.
    Strict,
}

impl FallbackPolicy {
    #[must_use]
    pub fn from_flag(fallback_on_error: bool) -> Self {
        if fallback_on_error {
            FallbackPolicy::MockOnError
        } else {
            FallbackPolicy::Strict
        }
    }
}

/// Endpoint configuration for every carrier in the closed set.
#[derive(Debug, Clone, Default)]
pub struct ShippingConfig {
    endpoints: HashMap<Carrier, ProviderEndpoint>,
    /// Optional Thailand Post API key, sent as a bearer token.
    pub thai_api_key: Option<String>,
}

impl ShippingConfig {
    /// Load provider slots from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Load provider slots through an injectable lookup, mirroring the app
    /// config loader so tests never touch the process environment.
    ///
    /// Loading never fails: malformed header JSON or an unknown method is
    /// logged and ignored so one bad slot cannot take the service down.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut endpoints = HashMap::new();

        for carrier in Carrier::ALL {
            let prefix = carrier.config_prefix();
            let Ok(url_template) = lookup(&format!("{prefix}_TRACK_URL")) else {
                continue;
            };

            let method = lookup(&format!("{prefix}_TRACK_METHOD"))
                .ok()
                .map_or(Method::GET, |raw| parse_method(prefix, &raw));

            let headers = lookup(&format!("{prefix}_TRACK_HEADERS"))
                .ok()
                .map_or_else(Vec::new, |raw| parse_headers(prefix, &raw));

            let body_template = lookup(&format!("{prefix}_TRACK_BODY")).ok();

            endpoints.insert(
                carrier,
                ProviderEndpoint {
                    url_template,
                    method,
                    headers,
                    body_template,
                },
            );
        }

        Self {
            endpoints,
            thai_api_key: lookup("THAI_API_KEY").ok(),
        }
    }

    /// The endpoint configured for `carrier`, or `None` when the URL slot is
    /// absent (the executor then answers `Mocked`).
    #[must_use]
    pub fn endpoint(&self, carrier: Carrier) -> Option<&ProviderEndpoint> {
        self.endpoints.get(&carrier)
    }

    /// Insert or replace an endpoint; used by tests and embedded setups.
    pub fn set_endpoint(&mut self, carrier: Carrier, endpoint: ProviderEndpoint) {
        self.endpoints.insert(carrier, endpoint);
    }
}

fn parse_method(prefix: &str, raw: &str) -> Method {
    let upper = raw.trim().to_uppercase();
    Method::from_bytes(upper.as_bytes()).unwrap_or_else(|_| {
        tracing::warn!(provider = prefix, method = raw, "unknown HTTP method in config; using GET");
        Method::GET
    })
}

/// Parse the JSON-object header slot. Malformed JSON or non-string values are
/// ignored, not fatal.
fn parse_headers(prefix: &str, raw: &str) -> Vec<(String, String)> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(name, value)| match value {
                serde_json::Value::String(v) => Some((name, v)),
                other => {
                    tracing::warn!(
                        provider = prefix,
                        header = name,
                        value = %other,
                        "non-string header value in config; ignoring"
                    );
                    None
                }
            })
            .collect(),
        Ok(_) | Err(_) => {
            tracing::warn!(
                provider = prefix,
                "malformed {prefix}_TRACK_HEADERS; ignoring"
            );
            Vec::new()
        }
    }
}
