//! Best-effort payment-method enrichment.
//!
//! The storefront shows "card" / "promptpay" / "cash" badges on admin order
//! rows. The payment processor is an external collaborator reached through a
//! configured payment-intent URL; when the slot is absent the enrichment is
//! skipped entirely, and per-order failures only cost that order its badge.

use std::time::Duration;

use percent_encoding::utf8_percent_encode;
use reqwest::Client;

use orchid_shipping::client::URL_COMPONENT;

/// Token substituted with the payment-intent id in the configured URL.
const PAYMENT_TOKEN: &str = "{payment_id}";

pub struct PaymentLookup {
    client: Client,
    intent_url_template: Option<String>,
    api_key: Option<String>,
}

impl PaymentLookup {
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the underlying client cannot be built.
    pub fn new(
        intent_url_template: Option<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            intent_url_template,
            api_key,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.intent_url_template.is_some()
    }

    /// Resolve the payment method of one payment intent, best-effort.
    ///
    /// Returns `None` when the lookup is unconfigured, the request fails, or
    /// the intent carries no recognizable method; failures are logged at
    /// warn and never propagate.
    pub async fn payment_method(&self, payment_id: &str) -> Option<&'static str> {
        let template = self.intent_url_template.as_ref()?;
        let encoded = utf8_percent_encode(payment_id, URL_COMPONENT).to_string();
        let url = template.replace(PAYMENT_TOKEN, &encoded);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let body: serde_json::Value = match request.send().await {
            Ok(response) => match response.json().await {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(payment_id, error = %err, "payment intent body unreadable");
                    return None;
                }
            },
            Err(err) => {
                tracing::warn!(payment_id, error = %err, "payment intent lookup failed");
                return None;
            }
        };

        body.get("payment_method_types")
            .and_then(|types| types.get(0))
            .and_then(serde_json::Value::as_str)
            .and_then(map_method_type)
    }
}

/// Collapse processor method types onto the storefront's three badges.
fn map_method_type(method: &str) -> Option<&'static str> {
    match method {
        "card" => Some("card"),
        "promptpay" | "wechat_pay" => Some("promptpay"),
        "cash" => Some("cash"),
        _ => None,
    }
}
