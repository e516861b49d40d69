//! Server configuration, materialized from environment variables.

use anyhow::{Context, Result};
use prescription_engine::FulfillmentPolicy;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener
    pub bind_address: String,
    /// Postgres connection string
    pub database_url: String,
    /// Maximum pool connections
    pub max_connections: u32,
    /// Payment provider API base URL
    pub payment_provider_url: String,
    /// Payment provider API key
    pub payment_api_key: String,
    /// Where the provider redirects the customer after checkout
    pub payment_success_url: String,
    pub payment_cancel_url: String,
    /// Business parameter: estimated delivery lead time in days
    pub delivery_lead_days: i64,
    /// ISO currency code passed to the payment provider
    pub currency: String,
    /// Optional notification webhook endpoint; unset disables delivery
    pub notify_webhook_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` or the payment provider settings are
    /// missing; everything else has a development default.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;
        let payment_provider_url = std::env::var("PAYMENT_PROVIDER_URL")
            .unwrap_or_else(|_| "https://api.payments.example.com".to_string());
        let payment_api_key =
            std::env::var("PAYMENT_API_KEY").context("PAYMENT_API_KEY must be set")?;

        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            payment_provider_url,
            payment_api_key,
            payment_success_url: std::env::var("PAYMENT_SUCCESS_URL")
                .unwrap_or_else(|_| "https://pharmacare.dev/payments/success".to_string()),
            payment_cancel_url: std::env::var("PAYMENT_CANCEL_URL")
                .unwrap_or_else(|_| "https://pharmacare.dev/payments/cancel".to_string()),
            delivery_lead_days: std::env::var("DELIVERY_LEAD_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
            currency: std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "GBP".to_string()),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
        })
    }

    /// The business knobs handed to the payment gate.
    pub fn fulfillment_policy(&self) -> FulfillmentPolicy {
        FulfillmentPolicy {
            delivery_lead_days: self.delivery_lead_days,
            currency: self.currency.clone(),
        }
    }
}
