//! Postgres persistence for the prescription engine.
//!
//! The engine's repository traits are implemented over the shared pool for
//! single-statement operations. Handlers that must mutate a prescription and
//! an order together use the `*_for_update` helpers inside an explicit
//! transaction so both rows move (or neither does).

pub mod rows;

use async_trait::async_trait;
use prescription_engine::{
    AssignmentRepository, Complaint, EngineError, EngineResult, Order, OrderRepository,
    Prescription, PrescriptionRepository, StaffDirectory, StaffMember,
};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use rows::{ComplaintRow, OrderRow, PrescriptionRow, StaffRow};

const PRESCRIPTION_COLUMNS: &str = "id, user_id, assigned_staff_id, medicines, medicine, \
     quantity, amount, delivery_address, status, payment_status, files, primary_filename, \
     approved_by, approved_at, rejection_reason, assigned_by, assigned_at, tracking_number, \
     courier_name, dispatched_at, delivered_at, paid_at, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, order_number, prescription_id, payment_session_id, \
     total_amount, delivery_address, status, tracking_number, courier_name, paid_at, \
     estimated_delivery, dispatched_at, delivered_at, created_at, updated_at";

const COMPLAINT_COLUMNS: &str = "id, user_id, subject, message, assigned_staff_id, \
     assigned_by, assigned_at, status, created_at, updated_at";

/// Map sqlx failures into engine errors. Unique-key violations surface as
/// concurrency conflicts so a webhook race on `payment_session_id` resolves
/// to 409 instead of 500.
fn map_db_err(err: sqlx::Error) -> EngineError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            EngineError::Concurrency(format!("unique constraint violated: {db}"))
        }
        _ => EngineError::Repository(err.to_string()),
    }
}

fn medicines_json(prescription: &Prescription) -> EngineResult<serde_json::Value> {
    serde_json::to_value(&prescription.medicines)
        .map_err(|e| EngineError::Repository(format!("medicines encode failed: {e}")))
}

fn files_json(prescription: &Prescription) -> EngineResult<serde_json::Value> {
    serde_json::to_value(&prescription.files)
        .map_err(|e| EngineError::Repository(format!("files encode failed: {e}")))
}

// ---------------------------------------------------------------------------
// Prescriptions
// ---------------------------------------------------------------------------

pub async fn insert_prescription(
    conn: &mut PgConnection,
    prescription: &Prescription,
) -> EngineResult<()> {
    let sql = format!(
        "INSERT INTO prescriptions ({PRESCRIPTION_COLUMNS}) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
          $18, $19, $20, $21, $22, $23, $24)"
    );
    sqlx::query(&sql)
        .bind(prescription.id)
        .bind(prescription.user_id)
        .bind(prescription.assigned_staff_id)
        .bind(medicines_json(prescription)?)
        .bind(&prescription.medicine)
        .bind(prescription.quantity)
        .bind(prescription.amount)
        .bind(&prescription.delivery_address)
        .bind(prescription.status.to_string())
        .bind(prescription.payment_status.to_string())
        .bind(files_json(prescription)?)
        .bind(&prescription.primary_filename)
        .bind(prescription.approved_by)
        .bind(prescription.approved_at)
        .bind(&prescription.rejection_reason)
        .bind(prescription.assigned_by)
        .bind(prescription.assigned_at)
        .bind(&prescription.tracking_number)
        .bind(&prescription.courier_name)
        .bind(prescription.dispatched_at)
        .bind(prescription.delivered_at)
        .bind(prescription.paid_at)
        .bind(prescription.created_at)
        .bind(prescription.updated_at)
        .execute(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

pub async fn update_prescription(
    conn: &mut PgConnection,
    prescription: &Prescription,
) -> EngineResult<()> {
    let result = sqlx::query(
        "UPDATE prescriptions SET \
             assigned_staff_id = $2, medicines = $3, medicine = $4, quantity = $5, \
             amount = $6, delivery_address = $7, status = $8, payment_status = $9, \
             files = $10, primary_filename = $11, approved_by = $12, approved_at = $13, \
             rejection_reason = $14, assigned_by = $15, assigned_at = $16, \
             tracking_number = $17, courier_name = $18, dispatched_at = $19, \
             delivered_at = $20, paid_at = $21, updated_at = $22 \
         WHERE id = $1",
    )
    .bind(prescription.id)
    .bind(prescription.assigned_staff_id)
    .bind(medicines_json(prescription)?)
    .bind(&prescription.medicine)
    .bind(prescription.quantity)
    .bind(prescription.amount)
    .bind(&prescription.delivery_address)
    .bind(prescription.status.to_string())
    .bind(prescription.payment_status.to_string())
    .bind(files_json(prescription)?)
    .bind(&prescription.primary_filename)
    .bind(prescription.approved_by)
    .bind(prescription.approved_at)
    .bind(&prescription.rejection_reason)
    .bind(prescription.assigned_by)
    .bind(prescription.assigned_at)
    .bind(&prescription.tracking_number)
    .bind(&prescription.courier_name)
    .bind(prescription.dispatched_at)
    .bind(prescription.delivered_at)
    .bind(prescription.paid_at)
    .bind(prescription.updated_at)
    .execute(conn)
    .await
    .map_err(map_db_err)?;

    if result.rows_affected() == 0 {
        return Err(EngineError::not_found("prescription", prescription.id));
    }
    Ok(())
}

pub async fn find_prescription(
    conn: &mut PgConnection,
    id: Uuid,
) -> EngineResult<Option<Prescription>> {
    let sql = format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = $1");
    let row: Option<PrescriptionRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(map_db_err)?;
    row.map(Prescription::try_from).transpose()
}

/// Lock a prescription row for the duration of the caller's transaction.
pub async fn prescription_for_update(
    conn: &mut PgConnection,
    id: Uuid,
) -> EngineResult<Option<Prescription>> {
    let sql = format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = $1 FOR UPDATE");
    let row: Option<PrescriptionRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(map_db_err)?;
    row.map(Prescription::try_from).transpose()
}

/// Filters for the prescription list query. `owner` is the access scope;
/// `status` and `assigned_staff_id` are optional caller filters.
#[derive(Debug, Clone, Default)]
pub struct PrescriptionFilter {
    pub owner: Option<Uuid>,
    pub status: Option<String>,
    pub assigned_staff_id: Option<Uuid>,
}

/// Prescriptions in reverse creation order, filtered and paginated.
pub async fn list_prescriptions(
    pool: &Pool<Postgres>,
    filter: &PrescriptionFilter,
    limit: i64,
    offset: i64,
) -> EngineResult<(Vec<Prescription>, i64)> {
    let mut conditions = Vec::new();
    if filter.owner.is_some() {
        conditions.push(format!("user_id = ${}", conditions.len() + 1));
    }
    if filter.status.is_some() {
        conditions.push(format!("status = ${}", conditions.len() + 1));
    }
    if filter.assigned_staff_id.is_some() {
        conditions.push(format!("assigned_staff_id = ${}", conditions.len() + 1));
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions {where_clause} \
         ORDER BY created_at DESC LIMIT {limit} OFFSET {offset}"
    );
    let count_sql = format!("SELECT COUNT(*) FROM prescriptions {where_clause}");

    let mut query = sqlx::query_as::<_, PrescriptionRow>(&sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(owner) = filter.owner {
        query = query.bind(owner);
        count_query = count_query.bind(owner);
    }
    if let Some(status) = &filter.status {
        query = query.bind(status.clone());
        count_query = count_query.bind(status.clone());
    }
    if let Some(staff_id) = filter.assigned_staff_id {
        query = query.bind(staff_id);
        count_query = count_query.bind(staff_id);
    }

    let rows = query.fetch_all(pool).await.map_err(map_db_err)?;
    let total = count_query.fetch_one(pool).await.map_err(map_db_err)?;
    let prescriptions = rows
        .into_iter()
        .map(Prescription::try_from)
        .collect::<EngineResult<Vec<_>>>()?;
    Ok((prescriptions, total))
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

pub async fn insert_order(conn: &mut PgConnection, order: &Order) -> EngineResult<()> {
    let sql = format!(
        "INSERT INTO orders ({ORDER_COLUMNS}) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
    );
    sqlx::query(&sql)
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.prescription_id)
        .bind(&order.payment_session_id)
        .bind(order.total_amount)
        .bind(&order.delivery_address)
        .bind(order.status.to_string())
        .bind(&order.tracking_number)
        .bind(&order.courier_name)
        .bind(order.paid_at)
        .bind(order.estimated_delivery)
        .bind(order.dispatched_at)
        .bind(order.delivered_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

pub async fn update_order(conn: &mut PgConnection, order: &Order) -> EngineResult<()> {
    let result = sqlx::query(
        "UPDATE orders SET \
             status = $2, tracking_number = $3, courier_name = $4, dispatched_at = $5, \
             delivered_at = $6, updated_at = $7 \
         WHERE id = $1",
    )
    .bind(order.id)
    .bind(order.status.to_string())
    .bind(&order.tracking_number)
    .bind(&order.courier_name)
    .bind(order.dispatched_at)
    .bind(order.delivered_at)
    .bind(order.updated_at)
    .execute(conn)
    .await
    .map_err(map_db_err)?;

    if result.rows_affected() == 0 {
        return Err(EngineError::not_found("order", order.id));
    }
    Ok(())
}

pub async fn find_order(conn: &mut PgConnection, id: Uuid) -> EngineResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(map_db_err)?;
    row.map(Order::try_from).transpose()
}

pub async fn order_for_update(conn: &mut PgConnection, id: Uuid) -> EngineResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(map_db_err)?;
    row.map(Order::try_from).transpose()
}

pub async fn find_order_by_session(
    conn: &mut PgConnection,
    payment_session_id: &str,
) -> EngineResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_session_id = $1");
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(payment_session_id)
        .fetch_optional(conn)
        .await
        .map_err(map_db_err)?;
    row.map(Order::try_from).transpose()
}

/// Orders in reverse creation order. For customers the list is scoped to
/// orders whose prescription they own.
pub async fn list_orders(
    pool: &Pool<Postgres>,
    owner: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> EngineResult<(Vec<Order>, i64)> {
    let filter = if owner.is_some() {
        "JOIN prescriptions p ON p.id = o.prescription_id AND p.user_id = $1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT o.* FROM orders o {filter} \
         ORDER BY o.created_at DESC LIMIT {limit} OFFSET {offset}"
    );
    let count_sql = format!("SELECT COUNT(*) FROM orders o {filter}");

    let mut query = sqlx::query_as::<_, OrderRow>(&sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(owner) = owner {
        query = query.bind(owner);
        count_query = count_query.bind(owner);
    }

    let rows = query.fetch_all(pool).await.map_err(map_db_err)?;
    let total = count_query.fetch_one(pool).await.map_err(map_db_err)?;
    let orders = rows
        .into_iter()
        .map(Order::try_from)
        .collect::<EngineResult<Vec<_>>>()?;
    Ok((orders, total))
}

// ---------------------------------------------------------------------------
// Complaints
// ---------------------------------------------------------------------------

pub async fn insert_complaint(conn: &mut PgConnection, complaint: &Complaint) -> EngineResult<()> {
    let sql = format!(
        "INSERT INTO complaints ({COMPLAINT_COLUMNS}) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
    );
    sqlx::query(&sql)
        .bind(complaint.id)
        .bind(complaint.user_id)
        .bind(&complaint.subject)
        .bind(&complaint.message)
        .bind(complaint.assigned_staff_id)
        .bind(complaint.assigned_by)
        .bind(complaint.assigned_at)
        .bind(complaint.status.to_string())
        .bind(complaint.created_at)
        .bind(complaint.updated_at)
        .execute(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

pub async fn find_complaint(conn: &mut PgConnection, id: Uuid) -> EngineResult<Option<Complaint>> {
    let sql = format!("SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1");
    let row: Option<ComplaintRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(map_db_err)?;
    row.map(Complaint::try_from).transpose()
}

pub async fn list_complaints(
    pool: &Pool<Postgres>,
    owner: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> EngineResult<(Vec<Complaint>, i64)> {
    let filter = if owner.is_some() {
        "WHERE user_id = $1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints {filter} \
         ORDER BY created_at DESC LIMIT {limit} OFFSET {offset}"
    );
    let count_sql = format!("SELECT COUNT(*) FROM complaints {filter}");

    let mut query = sqlx::query_as::<_, ComplaintRow>(&sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(owner) = owner {
        query = query.bind(owner);
        count_query = count_query.bind(owner);
    }

    let rows = query.fetch_all(pool).await.map_err(map_db_err)?;
    let total = count_query.fetch_one(pool).await.map_err(map_db_err)?;
    let complaints = rows
        .into_iter()
        .map(Complaint::try_from)
        .collect::<EngineResult<Vec<_>>>()?;
    Ok((complaints, total))
}

// ---------------------------------------------------------------------------
// Repository trait implementations over the shared pool
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgPrescriptionRepository {
    pool: Pool<Postgres>,
}

impl PgPrescriptionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrescriptionRepository for PgPrescriptionRepository {
    async fn find(&self, id: Uuid) -> EngineResult<Option<Prescription>> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        find_prescription(&mut conn, id).await
    }

    async fn insert(&self, prescription: &Prescription) -> EngineResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        insert_prescription(&mut conn, prescription).await
    }

    async fn save(&self, prescription: &Prescription) -> EngineResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        update_prescription(&mut conn, prescription).await
    }
}

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: Pool<Postgres>,
}

impl PgOrderRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find(&self, id: Uuid) -> EngineResult<Option<Order>> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        find_order(&mut conn, id).await
    }

    async fn find_by_session(&self, payment_session_id: &str) -> EngineResult<Option<Order>> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        find_order_by_session(&mut conn, payment_session_id).await
    }

    async fn insert(&self, order: &Order) -> EngineResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        insert_order(&mut conn, order).await
    }

    async fn save(&self, order: &Order) -> EngineResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        update_order(&mut conn, order).await
    }
}

#[derive(Clone)]
pub struct PgStaffDirectory {
    pool: Pool<Postgres>,
}

impl PgStaffDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffDirectory for PgStaffDirectory {
    async fn roster(&self) -> EngineResult<Vec<StaffMember>> {
        let rows: Vec<StaffRow> = sqlx::query_as(
            "SELECT id, name, email, phone, created_at, updated_at \
             FROM staff ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(StaffMember::from).collect())
    }
}

#[derive(Clone)]
pub struct PgAssignmentRepository {
    pool: Pool<Postgres>,
}

impl PgAssignmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    async fn unassigned_prescriptions(&self) -> EngineResult<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT id FROM prescriptions WHERE assigned_staff_id IS NULL \
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn unassigned_complaints(&self) -> EngineResult<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT id FROM complaints WHERE assigned_staff_id IS NULL \
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn assign_prescription(
        &self,
        prescription_id: Uuid,
        staff_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> EngineResult<()> {
        let result = sqlx::query(
            "UPDATE prescriptions SET assigned_staff_id = $2, assigned_by = $3, \
                 assigned_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(prescription_id)
        .bind(staff_id)
        .bind(assigned_by)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(EngineError::not_found("prescription", prescription_id));
        }
        Ok(())
    }

    async fn assign_complaint(
        &self,
        complaint_id: Uuid,
        staff_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> EngineResult<()> {
        let result = sqlx::query(
            "UPDATE complaints SET assigned_staff_id = $2, assigned_by = $3, \
                 assigned_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(complaint_id)
        .bind(staff_id)
        .bind(assigned_by)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(EngineError::not_found("complaint", complaint_id));
        }
        Ok(())
    }
}
