mod common;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tuition_core::{
    core::{evaluate, ObligationGenerator, StatusReconciler},
    ledger::{
        BillingStatus, Expense, ExpenseCategory, ExpenseDraft, Registration, Snapshot, Student,
        StudentStatus,
    },
};

fn base_day() -> NaiveDate {
    common::date(2023, 1, 1)
}

fn day_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..1100).prop_map(|offset| base_day() + Duration::days(offset))
}

fn status_strategy() -> impl Strategy<Value = BillingStatus> {
    prop_oneof![
        Just(BillingStatus::Pending),
        Just(BillingStatus::Overdue),
        Just(BillingStatus::Paid),
    ]
}

fn expense_strategy() -> impl Strategy<Value = Expense> {
    (day_strategy(), status_strategy(), 1u32..100_000).prop_map(|(due, status, cents)| {
        let mut expense = Expense::from_draft(ExpenseDraft::new(
            "Generated",
            Decimal::new(cents.into(), 2),
            ExpenseCategory::Other,
            due,
        ));
        expense.status = status;
        if status == BillingStatus::Paid {
            expense.payment_date = Some(due);
        }
        expense
    })
}

fn student_strategy() -> impl Strategy<Value = Student> {
    (1u32..=31, 1u32..100_000, any::<bool>(), 0usize..1000).prop_map(
        |(due_day, cents, active, n)| {
            let mut student =
                common::student(&format!("s{n}"), Decimal::new(cents.into(), 2), due_day);
            if !active {
                student.status = StudentStatus::Inactive;
            }
            student
        },
    )
}

proptest! {
    #[test]
    fn generation_is_idempotent(
        students in prop::collection::vec(student_strategy(), 0..12),
        reference in day_strategy(),
    ) {
        let first = ObligationGenerator::generate(&students, &[], reference);
        let second = ObligationGenerator::generate(&students, &first, reference);
        prop_assert!(second.is_empty());
        let active_ids: std::collections::HashSet<_> =
            students.iter().filter(|s| s.is_active()).map(|s| s.id.as_str()).collect();
        prop_assert_eq!(first.len(), active_ids.len());
        for payment in &first {
            prop_assert!(payment.due_date.format("%Y-%m").to_string()
                == reference.format("%Y-%m").to_string());
        }
    }

    #[test]
    fn reconciliation_is_idempotent(
        records in prop::collection::vec(expense_strategy(), 0..20),
        reference in day_strategy(),
    ) {
        let once = StatusReconciler::reconcile(&records, reference);
        let twice = StatusReconciler::reconcile(&once, reference);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn reconciliation_is_monotonic(
        records in prop::collection::vec(expense_strategy(), 0..20),
        references in prop::collection::vec(day_strategy(), 1..6),
    ) {
        let mut current = records;
        for reference in references {
            let next = StatusReconciler::reconcile(&current, reference);
            for (before, after) in current.iter().zip(&next) {
                match before.status {
                    BillingStatus::Paid => prop_assert_eq!(after.status, BillingStatus::Paid),
                    BillingStatus::Overdue => prop_assert_eq!(after.status, BillingStatus::Overdue),
                    BillingStatus::Pending => {}
                }
                prop_assert_eq!(before.amount, after.amount);
                prop_assert_eq!(before.payment_date, after.payment_date);
            }
            current = next;
        }
    }

    #[test]
    fn evaluation_reaches_a_fixed_point(
        students in prop::collection::vec(student_strategy(), 0..8),
        expenses in prop::collection::vec(expense_strategy(), 0..8),
        reference in day_strategy(),
    ) {
        let snapshot = Snapshot {
            registrations: students
                .into_iter()
                .map(|s| Registration::new(s, Default::default()))
                .collect(),
            expenses,
            ..Snapshot::default()
        };
        let first = evaluate(&snapshot, reference);
        let second = evaluate(&first.snapshot, reference);
        prop_assert!(!second.changed());
        prop_assert_eq!(second.snapshot, first.snapshot);
    }
}
