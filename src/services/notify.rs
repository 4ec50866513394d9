//! Notification delivery.
//!
//! Notifications are fire-and-forget relative to the mutation that triggers
//! them: a failed delivery is logged and counted, never rolled back into the
//! mutation's outcome. The default transport is an HTTP webhook; tests use
//! [`NullNotifier`].

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout for webhook deliveries.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// A notification delivery collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `template` with `payload` to `address`. Returns whether the
    /// delivery was accepted.
    async fn notify(&self, address: &str, template: &str, payload: &Value) -> bool;
}

/// Webhook-backed notifier: posts one JSON document per notification to a
/// relay endpoint, which owns the actual channel (email, SMS, ...).
pub struct WebhookNotifier {
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier posting to `endpoint`.
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .user_agent("classgate/0.3")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { endpoint, client }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, address: &str, template: &str, payload: &Value) -> bool {
        let body = serde_json::json!({
            "to": address,
            "template": template,
            "payload": payload,
        });

        match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(address = %address, template = %template, "Notification delivered");
                true
            }
            Ok(response) => {
                warn!(
                    address = %address,
                    template = %template,
                    status = %response.status(),
                    "Notification relay rejected delivery"
                );
                false
            }
            Err(e) => {
                warn!(address = %address, template = %template, error = %e, "Notification delivery failed");
                false
            }
        }
    }
}

/// Notifier that accepts everything and delivers nothing. Used in tests and
/// when no relay endpoint is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, address: &str, template: &str, _payload: &Value) -> bool {
        debug!(address = %address, template = %template, "Notification dropped (null notifier)");
        true
    }
}
