//! Outbound integrations: the payment provider and the notification webhook.

pub mod notifier;
pub mod payment_provider;

pub use notifier::WebhookNotifier;
pub use payment_provider::PaymentProviderClient;
