//! HTTP client for the external payment provider.

use anyhow::Result;
use async_trait::async_trait;
use prescription_engine::{
    EngineError, EngineResult, PaymentProvider, PaymentSession, PaymentSessionRequest,
};
use serde::{Deserialize, Serialize};

/// Checkout session client over the provider's REST API.
///
/// Provider failures surface as [`EngineError::Payment`]; the caller's
/// prescription is never mutated on the initiate path, so every failure
/// here is retryable.
pub struct PaymentProviderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreateSessionBody<'a> {
    reference: String,
    amount: String,
    currency: &'a str,
    success_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    id: String,
    url: String,
}

impl PaymentProviderClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl PaymentProvider for PaymentProviderClient {
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> EngineResult<PaymentSession> {
        let url = format!("{}/v1/checkout/sessions", self.base_url);
        let body = CreateSessionBody {
            reference: request.prescription_id.to_string(),
            amount: request.amount.to_string(),
            currency: &request.currency,
            success_url: &request.success_url,
            cancel_url: &request.cancel_url,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Payment(format!("payment provider unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                prescription_id = %request.prescription_id,
                "payment provider rejected session request"
            );
            return Err(EngineError::Payment(format!(
                "payment provider returned {status}: {detail}"
            )));
        }

        let session: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Payment(format!("malformed provider response: {e}")))?;
        Ok(PaymentSession {
            session_id: session.id,
            redirect_url: session.url,
        })
    }
}
