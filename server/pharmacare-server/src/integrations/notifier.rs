//! Best-effort notification delivery.
//!
//! Notifications are advisory. A failed delivery is logged and dropped; it
//! never fails or retries the request that produced the event.

use anyhow::Result;
use async_trait::async_trait;
use prescription_engine::NotificationSink;

/// Posts lifecycle events to a configured webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn notify(&self, event: &str, payload: serde_json::Value) {
        let body = serde_json::json!({
            "event": event,
            "payload": payload,
            "sent_at": chrono::Utc::now(),
        });
        match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(event, "notification delivered");
            }
            Ok(response) => {
                tracing::warn!(event, status = %response.status(), "notification rejected");
            }
            Err(error) => {
                tracing::warn!(event, %error, "notification delivery failed");
            }
        }
    }
}
