//! Fulfillment tracker.
//!
//! Records courier metadata and dispatch/delivery stamps on an order once
//! it exists, mirroring the prescription's own tracking stamps. Order moves
//! follow the same table-driven rejection discipline as the prescription
//! state machine.

use chrono::Utc;

use crate::error::{EngineError, EngineResult};
use crate::models::{Order, OrderStatus};

fn illegal(order: &Order, to: OrderStatus) -> EngineError {
    EngineError::StateTransition {
        from: order.status.to_string(),
        to: to.to_string(),
    }
}

/// Record dispatch: tracking number (required), courier, `dispatched_at`.
///
/// # Errors
///
/// [`EngineError::Validation`] on a blank tracking number,
/// [`EngineError::StateTransition`] unless the order is `confirmed`.
pub fn dispatch(
    order: &mut Order,
    tracking_number: &str,
    courier_name: Option<&str>,
) -> EngineResult<()> {
    if order.status != OrderStatus::Confirmed {
        return Err(illegal(order, OrderStatus::Dispatched));
    }
    if tracking_number.trim().is_empty() {
        return Err(EngineError::validation(
            "tracking number is required before dispatch",
        ));
    }
    let now = Utc::now();
    order.tracking_number = Some(tracking_number.to_string());
    order.courier_name = courier_name.map(str::to_string);
    order.dispatched_at = Some(now);
    order.status = OrderStatus::Dispatched;
    order.updated_at = now;
    Ok(())
}

/// Record delivery.
///
/// # Errors
///
/// [`EngineError::StateTransition`] unless the order is `dispatched`.
pub fn deliver(order: &mut Order) -> EngineResult<()> {
    if order.status != OrderStatus::Dispatched {
        return Err(illegal(order, OrderStatus::Delivered));
    }
    let now = Utc::now();
    order.delivered_at = Some(now);
    order.status = OrderStatus::Delivered;
    order.updated_at = now;
    Ok(())
}

/// Administrative close-out after delivery.
///
/// # Errors
///
/// [`EngineError::StateTransition`] unless the order is `delivered`.
pub fn complete(order: &mut Order) -> EngineResult<()> {
    if order.status != OrderStatus::Delivered {
        return Err(illegal(order, OrderStatus::Completed));
    }
    order.status = OrderStatus::Completed;
    order.updated_at = Utc::now();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn confirmed_order() -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_number: "ORD-test".to_string(),
            prescription_id: Uuid::new_v4(),
            payment_session_id: "cs_test_789".to_string(),
            total_amount: Decimal::new(1599, 2),
            delivery_address: "12 Harbour St".to_string(),
            status: OrderStatus::Confirmed,
            tracking_number: None,
            courier_name: None,
            paid_at: now,
            estimated_delivery: now,
            dispatched_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_dispatch_without_tracking_number_rejected() {
        let mut order = confirmed_order();
        let err = dispatch(&mut order, "", None).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(order.dispatched_at.is_none());
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[test]
    fn test_dispatch_stamps_tracking_and_time() {
        let mut order = confirmed_order();
        dispatch(&mut order, "RM123456789GB", Some("Royal Mail")).unwrap();
        assert_eq!(order.status, OrderStatus::Dispatched);
        assert_eq!(order.tracking_number.as_deref(), Some("RM123456789GB"));
        assert_eq!(order.courier_name.as_deref(), Some("Royal Mail"));
        assert!(order.dispatched_at.is_some());
    }

    #[test]
    fn test_deliver_requires_dispatched() {
        let mut order = confirmed_order();
        let err = deliver(&mut order).unwrap_err();
        assert!(matches!(err, EngineError::StateTransition { .. }));

        dispatch(&mut order, "RM123456789GB", None).unwrap();
        deliver(&mut order).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.delivered_at.is_some());
    }

    #[test]
    fn test_complete_requires_delivered() {
        let mut order = confirmed_order();
        assert!(complete(&mut order).is_err());
        dispatch(&mut order, "RM123456789GB", None).unwrap();
        deliver(&mut order).unwrap();
        complete(&mut order).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }
}
