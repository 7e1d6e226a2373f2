//! Carrier dispatch: free-text carrier label in, normalized tracking events
//! out, with an explicit fallback policy for provider failures.

use crate::carrier::Carrier;
use crate::client::{ProviderClient, ProviderResult};
use crate::config::{FallbackPolicy, ShippingConfig};
use crate::error::ShippingError;
use crate::events::{extract_events, TrackingEvent};

/// A successful tracking answer, ready for the wire.
#[derive(Debug, Clone)]
pub struct TrackOutcome {
    pub provider: &'static str,
    pub tracking: String,
    /// `None` when the provider answered but the response shape was not
    /// recognized; `Some(vec![])` when it reported zero events.
    pub events: Option<Vec<TrackingEvent>>,
    pub warning: Option<String>,
}

/// Bundles the provider client, endpoint configuration, and failure policy.
///
/// The policy is a constructor parameter rather than an ambient flag so the
/// dispatcher stays testable without environment mutation.
pub struct Tracker {
    client: ProviderClient,
    config: ShippingConfig,
    policy: FallbackPolicy,
}

impl Tracker {
    #[must_use]
    pub fn new(client: ProviderClient, config: ShippingConfig, policy: FallbackPolicy) -> Self {
        Self {
            client,
            config,
            policy,
        }
    }

    /// Track a shipment for a free-text carrier label.
    ///
    /// # Errors
    ///
    /// - [`ShippingError::UnsupportedCarrier`] when the label matches no
    ///   known alias (fail closed).
    /// - [`ShippingError::NotImplemented`] for carriers in the closed set
    ///   without a live integration.
    /// - [`ShippingError::ProviderFailed`] on provider failure, only under
    ///   [`FallbackPolicy::Strict`]; the default policy answers with a
    ///   placeholder event instead.
    pub async fn track(
        &self,
        carrier: &str,
        tracking: &str,
    ) -> Result<TrackOutcome, ShippingError> {
        let Some(carrier) = Carrier::from_alias(carrier) else {
            return Err(ShippingError::UnsupportedCarrier(carrier.to_string()));
        };
        if !carrier.has_integration() {
            return Err(ShippingError::NotImplemented(carrier.label()));
        }

        let result = self.request(carrier, tracking).await;

        match result {
            ProviderResult::Mocked { warning, events } => Ok(TrackOutcome {
                provider: carrier.label(),
                tracking: tracking.to_string(),
                events: Some(events),
                warning: Some(warning),
            }),
            ProviderResult::Error { message } => match self.policy {
                FallbackPolicy::Strict => Err(ShippingError::ProviderFailed {
                    carrier: carrier.label(),
                    message,
                }),
                FallbackPolicy::MockOnError => {
                    tracing::warn!(
                        carrier = carrier.label(),
                        error = %message,
                        "provider request failed; answering with placeholder events"
                    );
                    Ok(TrackOutcome {
                        provider: carrier.label(),
                        tracking: tracking.to_string(),
                        events: Some(vec![TrackingEvent::placeholder(
                            "Provider unavailable - mocked",
                        )]),
                        warning: Some(format!("Provider error: {message}")),
                    })
                }
            },
            ProviderResult::Ok { body } => {
                let events = extract_events(&body);
                if events.is_none() {
                    tracing::debug!(
                        carrier = carrier.label(),
                        "provider response shape not recognized"
                    );
                }
                Ok(TrackOutcome {
                    provider: carrier.label(),
                    tracking: tracking.to_string(),
                    events,
                    warning: None,
                })
            }
        }
    }

    /// Best-effort event fetch for order lookups.
    ///
    /// Unlike [`Tracker::track`] this works for any carrier in the closed
    /// set (Kerry and Ninjavan included, when their slots are configured)
    /// and swallows every failure: mocked or failed requests simply yield
    /// `None`.
    pub async fn fetch_events(
        &self,
        carrier: Carrier,
        tracking: &str,
    ) -> Option<Vec<TrackingEvent>> {
        match self.request(carrier, tracking).await {
            ProviderResult::Ok { body } => extract_events(&body),
            ProviderResult::Mocked { .. } => None,
            ProviderResult::Error { message } => {
                tracing::warn!(
                    carrier = carrier.label(),
                    error = %message,
                    "best-effort provider lookup failed"
                );
                None
            }
        }
    }

    async fn request(&self, carrier: Carrier, tracking: &str) -> ProviderResult {
        self.client
            .execute(
                carrier.config_prefix(),
                self.config.endpoint(carrier),
                tracking,
                &self.extra_headers(carrier),
            )
            .await
    }

    /// Thailand Post wants its API key as a bearer token when configured.
    fn extra_headers(&self, carrier: Carrier) -> Vec<(String, String)> {
        match (carrier, &self.config.thai_api_key) {
            (Carrier::ThaiPost, Some(key)) => {
                vec![("Authorization".to_string(), format!("Bearer {key}"))]
            }
            _ => Vec::new(),
        }
    }
}
