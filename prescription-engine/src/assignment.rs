//! Staff assignment service.
//!
//! Distributes unassigned prescriptions and complaints across the staff
//! roster with a deterministic round-robin, and supports manual
//! reassignment with audit stamps. Assignment never mutates `status` or
//! `amount`.

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::StaffMember;
use crate::repository::{AssignmentRepository, StaffDirectory};

/// Deterministic round-robin over a snapshot: item `i` (in creation order)
/// goes to `roster[i % roster.len()]`.
///
/// # Errors
///
/// [`EngineError::NoStaffAvailable`] when the roster is empty. Callers
/// treat this as non-fatal: the sweep is skipped and items stay unassigned.
pub fn round_robin(items: &[Uuid], roster: &[StaffMember]) -> EngineResult<Vec<(Uuid, Uuid)>> {
    if roster.is_empty() {
        return Err(EngineError::NoStaffAvailable);
    }
    Ok(items
        .iter()
        .zip(roster.iter().cycle())
        .map(|(item, staff)| (*item, staff.id))
        .collect())
}

/// Counts of items linked during one assignment sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentSweep {
    pub prescriptions: usize,
    pub complaints: usize,
}

/// Assignment service over injected repository contracts.
pub struct AssignmentService<A, S> {
    assignments: A,
    staff: S,
}

impl<A, S> AssignmentService<A, S>
where
    A: AssignmentRepository,
    S: StaffDirectory,
{
    pub fn new(assignments: A, staff: S) -> Self {
        Self { assignments, staff }
    }

    /// Sweep every unassigned prescription and complaint across the roster.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoStaffAvailable`] when the roster is empty;
    /// repository errors otherwise.
    pub async fn assign_unassigned(&self) -> EngineResult<AssignmentSweep> {
        let roster = self.staff.roster().await?;
        if roster.is_empty() {
            tracing::warn!("assignment sweep skipped: no staff available");
            return Err(EngineError::NoStaffAvailable);
        }

        let mut sweep = AssignmentSweep::default();

        let prescriptions = self.assignments.unassigned_prescriptions().await?;
        for (prescription_id, staff_id) in round_robin(&prescriptions, &roster)? {
            self.assignments
                .assign_prescription(prescription_id, staff_id, None)
                .await?;
            sweep.prescriptions += 1;
        }

        let complaints = self.assignments.unassigned_complaints().await?;
        for (complaint_id, staff_id) in round_robin(&complaints, &roster)? {
            self.assignments
                .assign_complaint(complaint_id, staff_id, None)
                .await?;
            sweep.complaints += 1;
        }

        tracing::info!(
            prescriptions = sweep.prescriptions,
            complaints = sweep.complaints,
            staff = roster.len(),
            "assignment sweep complete"
        );
        Ok(sweep)
    }

    /// Manual override. Last-write-wins: reassigning an already-assigned
    /// item is allowed and simply replaces the link.
    pub async fn reassign_prescription(
        &self,
        prescription_id: Uuid,
        staff_id: Uuid,
        assigned_by: Uuid,
    ) -> EngineResult<()> {
        self.assignments
            .assign_prescription(prescription_id, staff_id, Some(assigned_by))
            .await
    }

    /// Manual complaint reassignment, same semantics as prescriptions.
    pub async fn reassign_complaint(
        &self,
        complaint_id: Uuid,
        staff_id: Uuid,
        assigned_by: Uuid,
    ) -> EngineResult<()> {
        self.assignments
            .assign_complaint(complaint_id, staff_id, Some(assigned_by))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn staff(name: &str) -> StaffMember {
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

    #[test]
    fn test_round_robin_five_items_two_staff() {
        let roster = vec![staff("Asha"), staff("Ben")];
        let items: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

        let pairs = round_robin(&items, &roster).unwrap();
        assert_eq!(pairs.len(), 5);
        // items 1, 3, 5 land on staff[0]; items 2, 4 on staff[1]
        assert_eq!(pairs[0].1, roster[0].id);
        assert_eq!(pairs[1].1, roster[1].id);
        assert_eq!(pairs[2].1, roster[0].id);
        assert_eq!(pairs[3].1, roster[1].id);
        assert_eq!(pairs[4].1, roster[0].id);
        // creation order preserved
        let assigned: Vec<Uuid> = pairs.iter().map(|(item, _)| *item).collect();
        assert_eq!(assigned, items);
    }

    #[test]
    fn test_empty_roster_is_no_staff_available() {
        let items = vec![Uuid::new_v4()];
        let err = round_robin(&items, &[]).unwrap_err();
        assert!(matches!(err, EngineError::NoStaffAvailable));
    }

    #[test]
    fn test_no_items_is_fine() {
        let roster = vec![staff("Asha")];
        assert!(round_robin(&[], &roster).unwrap().is_empty());
    }
}
