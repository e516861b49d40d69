//! Notification collaborator contract.

use async_trait::async_trait;

/// Fire-and-forget notification sink for status-change events (approval,
/// dispatch, delivery). Implementations must swallow their own failures;
/// a notification error never rolls back the operation that raised it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &str, payload: serde_json::Value);
}

/// Sink that only logs, used when no notification endpoint is configured.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl NotificationSink for NullNotifier {
    async fn notify(&self, event: &str, payload: serde_json::Value) {
        tracing::debug!(event, %payload, "notification suppressed (no sink configured)");
    }
}
