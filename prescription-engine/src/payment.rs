//! Payment gate and order derivation.
//!
//! A prescription becomes payable once a pharmacist has approved it with a
//! positive amount. Checkout goes through the external payment provider;
//! confirmation arrives later as a webhook that may be replayed, so order
//! derivation is idempotent on the payment-session id.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Order, OrderStatus, PaymentStatus, Prescription};
use crate::repository::{OrderRepository, PrescriptionRepository};
use crate::state::PrescriptionStatus;

/// Checkout request handed to the payment provider.
#[derive(Debug, Clone)]
pub struct PaymentSessionRequest {
    pub prescription_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Opaque checkout handle returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: String,
    pub redirect_url: String,
}

/// External payment provider contract.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// # Errors
    ///
    /// [`EngineError::Payment`] when the provider is unreachable or rejects
    /// the session request.
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> EngineResult<PaymentSession>;
}

#[async_trait]
impl<T: PaymentProvider + ?Sized> PaymentProvider for Arc<T> {
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> EngineResult<PaymentSession> {
        (**self).create_session(request).await
    }
}

/// Webhook outcome reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Succeeded,
    Failed,
}

/// Provider callback confirming or denying one checkout attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhook {
    pub session_id: String,
    pub prescription_id: Uuid,
    pub status: WebhookStatus,
}

/// Business parameters for order derivation. The delivery lead time comes
/// from configuration, never from the derivation logic itself.
#[derive(Debug, Clone)]
pub struct FulfillmentPolicy {
    pub delivery_lead_days: i64,
    pub currency: String,
}

impl Default for FulfillmentPolicy {
    fn default() -> Self {
        Self {
            delivery_lead_days: 7,
            currency: "GBP".to_string(),
        }
    }
}

/// A prescription is payable iff it is approved, unpaid, and priced.
pub fn is_payable(prescription: &Prescription) -> bool {
    prescription.status == PrescriptionStatus::Approved
        && prescription.payment_status == PaymentStatus::Unpaid
        && prescription.amount.is_some_and(|amount| amount > Decimal::ZERO)
}

/// Stamp a prescription as paid. Callers persist the change in the same
/// transaction as the derived order.
///
/// # Errors
///
/// [`EngineError::Payment`] when the prescription is not payable.
pub fn mark_paid(prescription: &mut Prescription, now: DateTime<Utc>) -> EngineResult<()> {
    if !is_payable(prescription) {
        return Err(EngineError::Payment(format!(
            "prescription {} is not payable (status {}, payment {})",
            prescription.id, prescription.status, prescription.payment_status
        )));
    }
    prescription.payment_status = PaymentStatus::Paid;
    prescription.paid_at = Some(now);
    prescription.updated_at = now;
    Ok(())
}

/// Derive the order for a prescription that was just marked paid.
///
/// Copies the amount into `total_amount` and the delivery address, stamps
/// `paid_at`, and computes `estimated_delivery` from the policy lead time.
///
/// # Errors
///
/// [`EngineError::Payment`] when the prescription carries no positive
/// approved amount.
pub fn derive_order(
    prescription: &Prescription,
    payment_session_id: &str,
    now: DateTime<Utc>,
    policy: &FulfillmentPolicy,
) -> EngineResult<Order> {
    let total_amount = match prescription.amount {
        Some(amount) if amount > Decimal::ZERO => amount,
        _ => {
            return Err(EngineError::Payment(format!(
                "prescription {} has no approved amount",
                prescription.id
            )))
        }
    };
    Ok(Order {
        id: Uuid::new_v4(),
        order_number: generate_order_number(),
        prescription_id: prescription.id,
        payment_session_id: payment_session_id.to_string(),
        total_amount,
        delivery_address: prescription.delivery_address.clone(),
        status: OrderStatus::Confirmed,
        tracking_number: None,
        courier_name: None,
        paid_at: now,
        estimated_delivery: now + Duration::days(policy.delivery_lead_days),
        dispatched_at: None,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    })
}

fn generate_order_number() -> String {
    format!("ORD-{}", Uuid::new_v4().simple())
}

/// Payment gate over injected repositories and the provider client.
pub struct PaymentGate<P, O, C> {
    prescriptions: P,
    orders: O,
    provider: C,
    policy: FulfillmentPolicy,
}

impl<P, O, C> PaymentGate<P, O, C>
where
    P: PrescriptionRepository,
    O: OrderRepository,
    C: PaymentProvider,
{
    pub fn new(prescriptions: P, orders: O, provider: C, policy: FulfillmentPolicy) -> Self {
        Self {
            prescriptions,
            orders,
            provider,
            policy,
        }
    }

    /// Start a checkout for a payable prescription owned by `user_id`.
    ///
    /// Nothing is mutated here; the prescription stays `approved/unpaid`
    /// until the provider webhook confirms, so retries are always possible.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for unknown or foreign prescriptions,
    /// [`EngineError::Validation`] when not payable,
    /// [`EngineError::Payment`] when the provider call fails.
    pub async fn initiate(
        &self,
        prescription_id: Uuid,
        user_id: Uuid,
        success_url: &str,
        cancel_url: &str,
    ) -> EngineResult<PaymentSession> {
        let prescription = self
            .prescriptions
            .find(prescription_id)
            .await?
            .ok_or_else(|| EngineError::not_found("prescription", prescription_id))?;

        // Owners only; foreign prescriptions look like they don't exist.
        if prescription.user_id != user_id {
            return Err(EngineError::not_found("prescription", prescription_id));
        }
        if !is_payable(&prescription) {
            return Err(EngineError::validation(
                "prescription is not payable: it must be approved, priced, and unpaid",
            ));
        }
        let amount = prescription
            .amount
            .ok_or_else(|| EngineError::validation("prescription has no approved amount"))?;

        let session = self
            .provider
            .create_session(&PaymentSessionRequest {
                prescription_id,
                amount,
                currency: self.policy.currency.clone(),
                success_url: success_url.to_string(),
                cancel_url: cancel_url.to_string(),
            })
            .await?;

        tracing::info!(
            prescription_id = %prescription_id,
            session_id = %session.session_id,
            "payment session created"
        );
        Ok(session)
    }

    /// Consume a provider webhook and derive the order.
    ///
    /// Idempotent: if an order already references the webhook's session id,
    /// it is returned unchanged and nothing else happens.
    ///
    /// # Errors
    ///
    /// [`EngineError::Payment`] for declines and unpayable prescriptions,
    /// [`EngineError::NotFound`] for unknown prescription ids.
    pub async fn confirm(&self, webhook: &PaymentWebhook) -> EngineResult<Order> {
        if let Some(existing) = self.orders.find_by_session(&webhook.session_id).await? {
            tracing::info!(
                session_id = %webhook.session_id,
                order_id = %existing.id,
                "payment webhook replayed; returning existing order"
            );
            return Ok(existing);
        }

        if webhook.status == WebhookStatus::Failed {
            return Err(EngineError::Payment(
                "payment provider reported a decline".to_string(),
            ));
        }

        let mut prescription = self
            .prescriptions
            .find(webhook.prescription_id)
            .await?
            .ok_or_else(|| EngineError::not_found("prescription", webhook.prescription_id))?;

        let now = Utc::now();
        mark_paid(&mut prescription, now)?;
        let order = derive_order(&prescription, &webhook.session_id, now, &self.policy)?;

        self.prescriptions.save(&prescription).await?;
        self.orders.insert(&order).await?;

        tracing::info!(
            prescription_id = %prescription.id,
            order_id = %order.id,
            order_number = %order.order_number,
            total_amount = %order.total_amount,
            "order derived from paid prescription"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, Prescription};

    fn approved_prescription(amount: Option<Decimal>) -> Prescription {
        let now = Utc::now();
        Prescription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            assigned_staff_id: None,
            medicines: vec![],
            medicine: "Amoxicillin".to_string(),
            quantity: 21,
            amount,
            delivery_address: "12 Harbour St".to_string(),
            status: PrescriptionStatus::Approved,
            payment_status: PaymentStatus::Unpaid,
            files: vec![],
            primary_filename: None,
            approved_by: Some(Uuid::new_v4()),
            approved_at: Some(now),
            rejection_reason: None,
            assigned_by: None,
            assigned_at: None,
            tracking_number: None,
            courier_name: None,
            dispatched_at: None,
            delivered_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_payable_requires_approved_unpaid_and_priced() {
        let priced = approved_prescription(Some(Decimal::new(1599, 2)));
        assert!(is_payable(&priced));

        let unpriced = approved_prescription(None);
        assert!(!is_payable(&unpriced));

        let mut paid = approved_prescription(Some(Decimal::new(1599, 2)));
        paid.payment_status = PaymentStatus::Paid;
        assert!(!is_payable(&paid));

        let mut pending = approved_prescription(Some(Decimal::new(1599, 2)));
        pending.status = PrescriptionStatus::Pending;
        assert!(!is_payable(&pending));
    }

    #[test]
    fn test_mark_paid_enforces_amount_invariant() {
        let mut p = approved_prescription(Some(Decimal::new(1599, 2)));
        mark_paid(&mut p, Utc::now()).unwrap();
        assert_eq!(p.payment_status, PaymentStatus::Paid);
        assert!(p.paid_at.is_some());
        // paid implies amount > 0
        assert!(p.amount.is_some_and(|a| a > Decimal::ZERO));

        let mut unpriced = approved_prescription(None);
        let err = mark_paid(&mut unpriced, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::Payment(_)));
        assert_eq!(unpriced.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_derive_order_copies_amount_and_address() {
        let mut p = approved_prescription(Some(Decimal::new(1599, 2)));
        let now = Utc::now();
        mark_paid(&mut p, now).unwrap();
        let policy = FulfillmentPolicy::default();
        let order = derive_order(&p, "cs_test_123", now, &policy).unwrap();

        assert_eq!(order.prescription_id, p.id);
        assert_eq!(order.payment_session_id, "cs_test_123");
        assert_eq!(order.total_amount, Decimal::new(1599, 2));
        assert_eq!(order.delivery_address, p.delivery_address);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.estimated_delivery, now + Duration::days(7));
        assert!(order.order_number.starts_with("ORD-"));
    }

    #[test]
    fn test_delivery_lead_comes_from_policy() {
        let mut p = approved_prescription(Some(Decimal::new(500, 2)));
        let now = Utc::now();
        mark_paid(&mut p, now).unwrap();
        let policy = FulfillmentPolicy {
            delivery_lead_days: 2,
            currency: "GBP".to_string(),
        };
        let order = derive_order(&p, "cs_test_456", now, &policy).unwrap();
        assert_eq!(order.estimated_delivery, now + Duration::days(2));
    }
}
