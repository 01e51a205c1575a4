//! Pure evaluation pass run before every read and after every command.

use chrono::NaiveDate;
use tracing::debug;

use crate::core::{obligations::ObligationGenerator, reconcile::StatusReconciler};
use crate::ledger::{Payment, Snapshot};

/// Result of evaluating a snapshot against a reference date.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub snapshot: Snapshot,
    pub generated: Vec<Payment>,
    pub escalated_payments: usize,
    pub escalated_expenses: usize,
}

impl Evaluation {
    /// Whether the evaluation produced anything that needs to be committed.
    pub fn changed(&self) -> bool {
        !self.generated.is_empty() || self.escalated_payments > 0 || self.escalated_expenses > 0
    }
}

/// Generates missing obligations for the reference month, then escalates
/// overdue payments and expenses. Never touches storage.
///
/// Evaluating the returned snapshot again with the same `reference` yields an
/// unchanged evaluation.
pub fn evaluate(snapshot: &Snapshot, reference: NaiveDate) -> Evaluation {
    let mut next = snapshot.clone();

    let generated =
        ObligationGenerator::generate(snapshot.active_students(), &snapshot.payments, reference);
    next.payments.extend(generated.iter().cloned());

    let escalated_payments = StatusReconciler::reconcile_in_place(&mut next.payments, reference);
    let escalated_expenses = StatusReconciler::reconcile_in_place(&mut next.expenses, reference);

    debug!(
        %reference,
        generated = generated.len(),
        escalated_payments,
        escalated_expenses,
        "evaluated billing snapshot"
    );

    Evaluation {
        snapshot: next,
        generated,
        escalated_payments,
        escalated_expenses,
    }
}
