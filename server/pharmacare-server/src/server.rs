use anyhow::Result;
use prescription_engine::{NotificationSink, NullNotifier};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::integrations::{PaymentProviderClient, WebhookNotifier};

/// Main PharmaCare server state
#[derive(Clone)]
pub struct PharmacareServer {
    /// Server configuration
    pub config: ServerConfig,
    /// Database connection pool
    pub db_pool: Pool<Postgres>,
    /// Payment provider client
    pub payment_client: Arc<PaymentProviderClient>,
    /// Notification sink (fire-and-forget)
    pub notifier: Arc<dyn NotificationSink>,
}

impl PharmacareServer {
    /// Create a new server instance, connecting the database pool and
    /// wiring the external collaborators from configuration.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let db_pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Self::with_pool(config, db_pool)
    }

    /// Create a server instance over an existing pool. Useful for tests.
    pub fn with_pool(config: ServerConfig, db_pool: Pool<Postgres>) -> Result<Self> {
        let payment_client = Arc::new(PaymentProviderClient::new(
            &config.payment_provider_url,
            &config.payment_api_key,
        )?);

        let notifier: Arc<dyn NotificationSink> = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url)?),
            None => Arc::new(NullNotifier),
        };

        Ok(Self {
            config,
            db_pool,
            payment_client,
            notifier,
        })
    }

    /// Fire a notification without blocking or failing the caller.
    pub fn notify(&self, event: &'static str, payload: serde_json::Value) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            notifier.notify(event, payload).await;
        });
    }
}

impl std::fmt::Debug for PharmacareServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PharmacareServer")
            .field("bind_address", &self.config.bind_address)
            .field(
                "notifier_enabled",
                &self.config.notify_webhook_url.is_some(),
            )
            .finish()
    }
}
