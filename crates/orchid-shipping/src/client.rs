//! Outbound provider request executor.
//!
//! Issues one templated HTTP request per call with a hard timeout. Nothing
//! escapes this boundary as an error: an unconfigured endpoint answers
//! `Mocked`, and any network, timeout, or parse failure is captured as
//! `Error { message }` for the dispatcher's fallback policy to handle.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};

use crate::config::{ProviderEndpoint, TRACKING_TOKEN};
use crate::error::ShippingError;
use crate::events::TrackingEvent;

/// Matches JavaScript's `encodeURIComponent`: everything but alphanumerics
/// and `- _ . ! ~ * ' ( )` is escaped.
pub const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Outcome of one provider request. Exactly one variant per call.
#[derive(Debug, Clone)]
pub enum ProviderResult {
    /// No endpoint configured; the caller gets placeholder events.
    Mocked {
        warning: String,
        events: Vec<TrackingEvent>,
    },
    /// The request failed (network, timeout, unparseable body).
    Error { message: String },
    /// The provider answered with a JSON body.
    Ok { body: serde_json::Value },
}

/// HTTP client for carrier tracking endpoints.
pub struct ProviderClient {
    client: Client,
}

impl ProviderClient {
    /// Creates a `ProviderClient` with the configured timeout and
    /// `User-Agent`. The timeout bounds the whole request; reqwest aborts
    /// the in-flight call when it elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ShippingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Perform one templated tracking request.
    ///
    /// The tracking number is percent-encoded when substituted into the URL
    /// template but left raw in the body template. POST/PUT requests without
    /// a body template send `{"tracking": "<number>"}`. `extra_headers` are
    /// merged last so explicit headers override configured ones.
    pub async fn execute(
        &self,
        prefix: &str,
        endpoint: Option<&ProviderEndpoint>,
        tracking: &str,
        extra_headers: &[(String, String)],
    ) -> ProviderResult {
        let Some(endpoint) = endpoint else {
            return ProviderResult::Mocked {
                warning: format!("Missing {prefix}_TRACK_URL configuration"),
                events: vec![TrackingEvent::placeholder("Mocked")],
            };
        };

        let encoded = utf8_percent_encode(tracking, URL_COMPONENT).to_string();
        let url = endpoint.url_template.replace(TRACKING_TOKEN, &encoded);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &endpoint.headers {
            insert_header(&mut headers, prefix, name, value);
        }
        for (name, value) in extra_headers {
            insert_header(&mut headers, prefix, name, value);
        }

        let mut request = self.client.request(endpoint.method.clone(), &url);

        if endpoint.method == Method::POST || endpoint.method == Method::PUT {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            let body = endpoint.body_template.as_ref().map_or_else(
                || serde_json::json!({ "tracking": tracking }).to_string(),
                |template| template.replace(TRACKING_TOKEN, tracking),
            );
            request = request.body(body);
        }

        match request.headers(headers).send().await {
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(body) => ProviderResult::Ok { body },
                Err(err) => ProviderResult::Error {
                    message: err.to_string(),
                },
            },
            Err(err) => ProviderResult::Error {
                message: err.to_string(),
            },
        }
    }
}

fn insert_header(headers: &mut HeaderMap, prefix: &str, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => {
            tracing::warn!(provider = prefix, header = name, "invalid header in config; skipping");
        }
    }
}
