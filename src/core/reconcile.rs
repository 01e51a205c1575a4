//! Time-driven status escalation for payments and expenses.

use chrono::NaiveDate;

use crate::ledger::{Billable, BillingStatus};

/// Moves pending records past their due date to overdue.
pub struct StatusReconciler;

impl StatusReconciler {
    /// Returns a copy of `records` with every pending record due before
    /// `reference` marked overdue. Paid, overdue, and not-yet-due records pass
    /// through unchanged.
    pub fn reconcile<T: Billable + Clone>(records: &[T], reference: NaiveDate) -> Vec<T> {
        let mut updated = records.to_vec();
        Self::reconcile_in_place(&mut updated, reference);
        updated
    }

    /// In-place variant of [`StatusReconciler::reconcile`], returning how many records changed.
    pub fn reconcile_in_place<T: Billable>(records: &mut [T], reference: NaiveDate) -> usize {
        let mut escalated = 0;
        for record in records.iter_mut() {
            if Self::is_past_due(record, reference) {
                record.set_status(BillingStatus::Overdue);
                escalated += 1;
            }
        }
        escalated
    }

    fn is_past_due<T: Billable>(record: &T, reference: NaiveDate) -> bool {
        record.status() == BillingStatus::Pending && record.due_date() < reference
    }
}
