//! End-to-end lifecycle tests over in-memory repositories: submission,
//! approval, payment confirmation with webhook replay, dispatch, and
//! round-robin staff assignment.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use prescription_engine::{
    fulfillment, is_payable, AssignmentRepository, AssignmentService, EngineError, EngineResult,
    FileReference, FulfillmentPolicy, MedicineLine, Order, OrderRepository, PaymentGate,
    PaymentProvider, PaymentSession, PaymentSessionRequest, PaymentStatus, PaymentWebhook,
    Prescription, PrescriptionRepository, PrescriptionService, PrescriptionStatus, StaffDirectory,
    StaffMember, SubmissionRequest, TransitionRequest, WebhookStatus,
};

#[derive(Default, Clone)]
struct InMemoryPrescriptions {
    rows: Arc<Mutex<HashMap<Uuid, Prescription>>>,
}

#[async_trait]
impl PrescriptionRepository for InMemoryPrescriptions {
    async fn find(&self, id: Uuid) -> EngineResult<Option<Prescription>> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn insert(&self, prescription: &Prescription) -> EngineResult<()> {
        self.rows
            .lock()
            .await
            .insert(prescription.id, prescription.clone());
        Ok(())
    }

    async fn save(&self, prescription: &Prescription) -> EngineResult<()> {
        self.rows
            .lock()
            .await
            .insert(prescription.id, prescription.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
struct InMemoryOrders {
    rows: Arc<Mutex<HashMap<Uuid, Order>>>,
}

impl InMemoryOrders {
    async fn count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn find(&self, id: Uuid) -> EngineResult<Option<Order>> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn find_by_session(&self, payment_session_id: &str) -> EngineResult<Option<Order>> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .find(|order| order.payment_session_id == payment_session_id)
            .cloned())
    }

    async fn insert(&self, order: &Order) -> EngineResult<()> {
        let mut rows = self.rows.lock().await;
        // mirror the unique constraint on payment_session_id
        if rows
            .values()
            .any(|existing| existing.payment_session_id == order.payment_session_id)
        {
            return Err(EngineError::Concurrency(format!(
                "order for session {} already exists",
                order.payment_session_id
            )));
        }
        rows.insert(order.id, order.clone());
        Ok(())
    }

    async fn save(&self, order: &Order) -> EngineResult<()> {
        self.rows.lock().await.insert(order.id, order.clone());
        Ok(())
    }
}

struct FakeProvider {
    sessions_created: AtomicUsize,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            sessions_created: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> EngineResult<PaymentSession> {
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentSession {
            session_id: format!("cs_test_{n}"),
            redirect_url: format!(
                "https://pay.example.com/checkout/{}?amount={}",
                n, request.amount
            ),
        })
    }
}

struct UnreachableProvider;

#[async_trait]
impl PaymentProvider for UnreachableProvider {
    async fn create_session(
        &self,
        _request: &PaymentSessionRequest,
    ) -> EngineResult<PaymentSession> {
        Err(EngineError::Payment(
            "payment provider unreachable".to_string(),
        ))
    }
}

fn evidence_file() -> FileReference {
    FileReference {
        url: "https://uploads.example.com/rx/scan-001.jpg".to_string(),
        declared_mime_type: "image/jpeg".to_string(),
    }
}

fn amoxicillin() -> MedicineLine {
    MedicineLine {
        name: "Amoxicillin".to_string(),
        dosage: "500mg".to_string(),
        quantity: 21,
        instructions: "3x daily".to_string(),
    }
}

async fn submit_sample(
    service: &PrescriptionService<InMemoryPrescriptions>,
    user_id: Uuid,
) -> Prescription {
    service
        .submit(SubmissionRequest {
            user_id,
            medicines: vec![amoxicillin()],
            files: vec![evidence_file()],
            delivery_address: "12 Harbour St, Whitstable".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_submission_lands_pending_with_derived_quantity() {
    let repo = InMemoryPrescriptions::default();
    let service = PrescriptionService::new(repo.clone());
    let user_id = Uuid::new_v4();

    let prescription = submit_sample(&service, user_id).await;

    assert_eq!(prescription.status, PrescriptionStatus::Pending);
    assert_eq!(prescription.payment_status, PaymentStatus::Unpaid);
    assert_eq!(prescription.quantity, 21);
    assert_eq!(prescription.medicine, "Amoxicillin");
    assert_eq!(
        prescription.primary_filename.as_deref(),
        Some("scan-001.jpg")
    );
    assert!(repo.find(prescription.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_submission_without_files_or_medicines_rejected() {
    let service = PrescriptionService::new(InMemoryPrescriptions::default());
    let user_id = Uuid::new_v4();

    let no_files = service
        .submit(SubmissionRequest {
            user_id,
            medicines: vec![amoxicillin()],
            files: vec![],
            delivery_address: "12 Harbour St".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(no_files, EngineError::Validation(_)));

    let no_medicines = service
        .submit(SubmissionRequest {
            user_id,
            medicines: vec![],
            files: vec![evidence_file()],
            delivery_address: "12 Harbour St".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(no_medicines, EngineError::Validation(_)));

    let blank_name = service
        .submit(SubmissionRequest {
            user_id,
            medicines: vec![MedicineLine {
                name: "  ".to_string(),
                dosage: "500mg".to_string(),
                quantity: 1,
                instructions: String::new(),
            }],
            files: vec![evidence_file()],
            delivery_address: "12 Harbour St".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(blank_name, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_approval_prices_and_stamps() {
    let repo = InMemoryPrescriptions::default();
    let service = PrescriptionService::new(repo.clone());
    let pharmacist = Uuid::new_v4();

    let submitted = submit_sample(&service, Uuid::new_v4()).await;
    service
        .transition(submitted.id, TransitionRequest::PickUp)
        .await
        .unwrap();
    let approved = service
        .transition(
            submitted.id,
            TransitionRequest::Approve {
                amount: Decimal::new(1599, 2),
                approved_by: pharmacist,
            },
        )
        .await
        .unwrap();

    assert_eq!(approved.status, PrescriptionStatus::Approved);
    assert_eq!(approved.payment_status, PaymentStatus::Unpaid);
    assert_eq!(approved.amount, Some(Decimal::new(1599, 2)));
    assert_eq!(approved.approved_by, Some(pharmacist));
    assert!(approved.approved_at.is_some());
    assert!(is_payable(&approved));
}

#[tokio::test]
async fn test_webhook_confirms_payment_and_replay_is_idempotent() {
    let prescriptions = InMemoryPrescriptions::default();
    let orders = InMemoryOrders::default();
    let service = PrescriptionService::new(prescriptions.clone());
    let user_id = Uuid::new_v4();

    let submitted = submit_sample(&service, user_id).await;
    service
        .transition(submitted.id, TransitionRequest::PickUp)
        .await
        .unwrap();
    service
        .transition(
            submitted.id,
            TransitionRequest::Approve {
                amount: Decimal::new(1599, 2),
                approved_by: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

    let gate = PaymentGate::new(
        prescriptions.clone(),
        orders.clone(),
        FakeProvider::new(),
        FulfillmentPolicy::default(),
    );

    let session = gate
        .initiate(
            submitted.id,
            user_id,
            "https://pharmacare.dev/pay/success",
            "https://pharmacare.dev/pay/cancel",
        )
        .await
        .unwrap();

    let webhook = PaymentWebhook {
        session_id: session.session_id.clone(),
        prescription_id: submitted.id,
        status: WebhookStatus::Succeeded,
    };

    let order = gate.confirm(&webhook).await.unwrap();
    assert_eq!(order.total_amount, Decimal::new(1599, 2));
    assert_eq!(order.prescription_id, submitted.id);

    let paid = prescriptions.find(submitted.id).await.unwrap().unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert!(paid.paid_at.is_some());
    // invariant: paid implies a positive amount
    assert!(paid.amount.is_some_and(|a| a > Decimal::ZERO));

    // replaying the same session id yields the same order, not a second one
    let replayed = gate.confirm(&webhook).await.unwrap();
    assert_eq!(replayed.id, order.id);
    assert_eq!(orders.count().await, 1);
}

#[tokio::test]
async fn test_decline_leaves_prescription_payable() {
    let prescriptions = InMemoryPrescriptions::default();
    let orders = InMemoryOrders::default();
    let service = PrescriptionService::new(prescriptions.clone());
    let user_id = Uuid::new_v4();

    let submitted = submit_sample(&service, user_id).await;
    service
        .transition(submitted.id, TransitionRequest::PickUp)
        .await
        .unwrap();
    service
        .transition(
            submitted.id,
            TransitionRequest::Approve {
                amount: Decimal::new(899, 2),
                approved_by: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

    let gate = PaymentGate::new(
        prescriptions.clone(),
        orders.clone(),
        FakeProvider::new(),
        FulfillmentPolicy::default(),
    );

    let err = gate
        .confirm(&PaymentWebhook {
            session_id: "cs_test_declined".to_string(),
            prescription_id: submitted.id,
            status: WebhookStatus::Failed,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Payment(_)));
    assert_eq!(orders.count().await, 0);

    // still approved/unpaid: retry is possible
    let unchanged = prescriptions.find(submitted.id).await.unwrap().unwrap();
    assert!(is_payable(&unchanged));
}

#[tokio::test]
async fn test_unreachable_provider_fails_initiate_without_mutation() {
    let prescriptions = InMemoryPrescriptions::default();
    let service = PrescriptionService::new(prescriptions.clone());
    let user_id = Uuid::new_v4();

    let submitted = submit_sample(&service, user_id).await;
    service
        .transition(submitted.id, TransitionRequest::PickUp)
        .await
        .unwrap();
    service
        .transition(
            submitted.id,
            TransitionRequest::Approve {
                amount: Decimal::new(1599, 2),
                approved_by: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

    let gate = PaymentGate::new(
        prescriptions.clone(),
        InMemoryOrders::default(),
        UnreachableProvider,
        FulfillmentPolicy::default(),
    );

    let err = gate
        .initiate(submitted.id, user_id, "https://s", "https://c")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Payment(_)));

    let unchanged = prescriptions.find(submitted.id).await.unwrap().unwrap();
    assert!(is_payable(&unchanged));
}

#[tokio::test]
async fn test_dispatch_and_delivery_mirror_onto_order() {
    let prescriptions = InMemoryPrescriptions::default();
    let orders = InMemoryOrders::default();
    let service = PrescriptionService::new(prescriptions.clone());
    let user_id = Uuid::new_v4();

    let submitted = submit_sample(&service, user_id).await;
    service
        .transition(submitted.id, TransitionRequest::PickUp)
        .await
        .unwrap();
    service
        .transition(
            submitted.id,
            TransitionRequest::Approve {
                amount: Decimal::new(1599, 2),
                approved_by: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

    let gate = PaymentGate::new(
        prescriptions.clone(),
        orders.clone(),
        FakeProvider::new(),
        FulfillmentPolicy::default(),
    );
    let session = gate
        .initiate(submitted.id, user_id, "https://s", "https://c")
        .await
        .unwrap();
    let mut order = gate
        .confirm(&PaymentWebhook {
            session_id: session.session_id,
            prescription_id: submitted.id,
            status: WebhookStatus::Succeeded,
        })
        .await
        .unwrap();

    // pharmacy prepares, then hands to courier
    service
        .transition(submitted.id, TransitionRequest::MarkReady)
        .await
        .unwrap();
    let dispatched = service
        .transition(
            submitted.id,
            TransitionRequest::Dispatch {
                tracking_number: "RM123456789GB".to_string(),
                courier_name: Some("Royal Mail".to_string()),
            },
        )
        .await
        .unwrap();
    fulfillment::dispatch(&mut order, "RM123456789GB", Some("Royal Mail")).unwrap();
    orders.save(&order).await.unwrap();

    assert_eq!(dispatched.status, PrescriptionStatus::Dispatched);
    assert!(dispatched.dispatched_at.is_some());
    assert_eq!(dispatched.tracking_number.as_deref(), Some("RM123456789GB"));
    assert_eq!(order.tracking_number.as_deref(), Some("RM123456789GB"));

    let delivered = service
        .transition(submitted.id, TransitionRequest::MarkDelivered)
        .await
        .unwrap();
    fulfillment::deliver(&mut order).unwrap();
    assert!(delivered.delivered_at.is_some());
    assert!(order.delivered_at.is_some());

    // invariant: anything dispatched or later carries a tracking number
    assert!(delivered.tracking_number.is_some());
}

#[derive(Default, Clone)]
struct InMemoryAssignments {
    prescriptions: Arc<Mutex<Vec<(Uuid, Option<Uuid>)>>>,
    complaints: Arc<Mutex<Vec<(Uuid, Option<Uuid>)>>>,
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignments {
    async fn unassigned_prescriptions(&self) -> EngineResult<Vec<Uuid>> {
        Ok(self
            .prescriptions
            .lock()
            .await
            .iter()
            .filter(|(_, staff)| staff.is_none())
            .map(|(id, _)| *id)
            .collect())
    }

    async fn unassigned_complaints(&self) -> EngineResult<Vec<Uuid>> {
        Ok(self
            .complaints
            .lock()
            .await
            .iter()
            .filter(|(_, staff)| staff.is_none())
            .map(|(id, _)| *id)
            .collect())
    }

    async fn assign_prescription(
        &self,
        prescription_id: Uuid,
        staff_id: Uuid,
        _assigned_by: Option<Uuid>,
    ) -> EngineResult<()> {
        let mut rows = self.prescriptions.lock().await;
        match rows.iter_mut().find(|(id, _)| *id == prescription_id) {
            Some(row) => {
                row.1 = Some(staff_id);
                Ok(())
            }
            None => Err(EngineError::not_found("prescription", prescription_id)),
        }
    }

    async fn assign_complaint(
        &self,
        complaint_id: Uuid,
        staff_id: Uuid,
        _assigned_by: Option<Uuid>,
    ) -> EngineResult<()> {
        let mut rows = self.complaints.lock().await;
        match rows.iter_mut().find(|(id, _)| *id == complaint_id) {
            Some(row) => {
                row.1 = Some(staff_id);
                Ok(())
            }
            None => Err(EngineError::not_found("complaint", complaint_id)),
        }
    }
}

#[derive(Default, Clone)]
struct InMemoryStaff {
    roster: Vec<StaffMember>,
}

#[async_trait]
impl StaffDirectory for InMemoryStaff {
    async fn roster(&self) -> EngineResult<Vec<StaffMember>> {
        Ok(self.roster.clone())
    }
}

fn staff_member(name: &str) -> StaffMember {
    let now = Utc::now();
    StaffMember {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@pharmacare.dev", name.to_lowercase()),
        phone: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_round_robin_sweep_over_two_person_roster() {
    let assignments = InMemoryAssignments::default();
    let items: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    {
        let mut rows = assignments.prescriptions.lock().await;
        for id in &items {
            rows.push((*id, None));
        }
    }
    let roster = vec![staff_member("Asha"), staff_member("Ben")];
    let staff_ids: Vec<Uuid> = roster.iter().map(|s| s.id).collect();

    let service = AssignmentService::new(assignments.clone(), InMemoryStaff { roster });
    let sweep = service.assign_unassigned().await.unwrap();
    assert_eq!(sweep.prescriptions, 5);
    assert_eq!(sweep.complaints, 0);

    let rows = assignments.prescriptions.lock().await;
    assert_eq!(rows[0].1, Some(staff_ids[0]));
    assert_eq!(rows[1].1, Some(staff_ids[1]));
    assert_eq!(rows[2].1, Some(staff_ids[0]));
    assert_eq!(rows[3].1, Some(staff_ids[1]));
    assert_eq!(rows[4].1, Some(staff_ids[0]));
}

#[tokio::test]
async fn test_empty_roster_skips_sweep() {
    let assignments = InMemoryAssignments::default();
    assignments
        .prescriptions
        .lock()
        .await
        .push((Uuid::new_v4(), None));

    let service = AssignmentService::new(assignments.clone(), InMemoryStaff::default());
    let err = service.assign_unassigned().await.unwrap_err();
    assert!(matches!(err, EngineError::NoStaffAvailable));

    // item stays unassigned, nothing was mutated
    assert_eq!(assignments.unassigned_prescriptions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_manual_reassignment_is_last_write_wins() {
    let assignments = InMemoryAssignments::default();
    let prescription_id = Uuid::new_v4();
    assignments
        .prescriptions
        .lock()
        .await
        .push((prescription_id, None));

    let first = staff_member("Asha");
    let second = staff_member("Ben");
    let admin = Uuid::new_v4();
    let service = AssignmentService::new(
        assignments.clone(),
        InMemoryStaff {
            roster: vec![first.clone(), second.clone()],
        },
    );

    service
        .reassign_prescription(prescription_id, first.id, admin)
        .await
        .unwrap();
    service
        .reassign_prescription(prescription_id, second.id, admin)
        .await
        .unwrap();

    let rows = assignments.prescriptions.lock().await;
    assert_eq!(rows[0].1, Some(second.id));
}
