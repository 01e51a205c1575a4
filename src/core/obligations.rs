//! Derives the monthly tuition obligations that should exist for the active roster.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::ledger::{due_date_in, BillingStatus, MonthKey, Payment, Student};

/// Stateless generator of per-student, per-month payment obligations.
pub struct ObligationGenerator;

impl ObligationGenerator {
    /// Returns the payments to add so every active student has an obligation for
    /// the month containing `reference`.
    ///
    /// Existing payments are never modified. An obligation is considered present
    /// when a payment with its deterministic id already exists, so repeated calls
    /// for the same month are no-ops.
    pub fn generate<'a>(
        students: impl IntoIterator<Item = &'a Student>,
        existing: &[Payment],
        reference: NaiveDate,
    ) -> Vec<Payment> {
        let month = MonthKey::of(reference);
        let mut known: HashSet<String> = existing.iter().map(|p| p.id.clone()).collect();
        let mut generated = Vec::new();

        for student in students.into_iter().filter(|s| s.is_active()) {
            let id = Payment::obligation_id(&student.id, month);
            if !known.insert(id.clone()) {
                continue;
            }
            let payment = Self::obligation_for(student, id, month, reference);
            debug!(
                payment = %payment.id,
                due = %payment.due_date,
                status = %payment.status,
                "generated tuition obligation"
            );
            generated.push(payment);
        }

        generated
    }

    fn obligation_for(
        student: &Student,
        id: String,
        month: MonthKey,
        reference: NaiveDate,
    ) -> Payment {
        let due_date = due_date_in(month, student.payment_due_day);
        let status = if due_date < reference {
            BillingStatus::Overdue
        } else {
            BillingStatus::Pending
        };
        Payment {
            id,
            student_id: student.id.clone(),
            student_name: student.full_name.clone(),
            amount: student.monthly_fee,
            due_date,
            payment_date: None,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::StudentStatus;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn student(id: &str, due_day: u32) -> Student {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut student = Student::new(format!("Student {id}"), dec!(250), due_day, created);
        student.id = id.into();
        student
    }

    #[test]
    fn past_due_day_generates_overdue_obligation() {
        let roster = [student("1", 10)];
        let generated = ObligationGenerator::generate(&roster, &[], date(2024, 3, 15));
        assert_eq!(generated.len(), 1);
        let payment = &generated[0];
        assert_eq!(payment.id, "1-2024-03");
        assert_eq!(payment.due_date, date(2024, 3, 10));
        assert_eq!(payment.status, BillingStatus::Overdue);
        assert_eq!(payment.amount, dec!(250));
        assert_eq!(payment.student_name, "Student 1");
    }

    #[test]
    fn upcoming_due_day_generates_pending_obligation() {
        let roster = [student("1", 10)];
        let generated = ObligationGenerator::generate(&roster, &[], date(2024, 3, 5));
        assert_eq!(generated[0].due_date, date(2024, 3, 10));
        assert_eq!(generated[0].status, BillingStatus::Pending);
    }

    #[test]
    fn due_today_stays_pending() {
        let roster = [student("1", 10)];
        let generated = ObligationGenerator::generate(&roster, &[], date(2024, 3, 10));
        assert_eq!(generated[0].status, BillingStatus::Pending);
    }

    #[test]
    fn due_day_is_clamped_in_short_months() {
        let roster = [student("1", 31)];
        let generated = ObligationGenerator::generate(&roster, &[], date(2023, 2, 1));
        assert_eq!(generated[0].due_date, date(2023, 2, 28));
    }

    #[test]
    fn second_pass_in_same_month_is_a_no_op() {
        let roster = [student("1", 10), student("2", 20)];
        let first = ObligationGenerator::generate(&roster, &[], date(2024, 3, 5));
        assert_eq!(first.len(), 2);
        let again = ObligationGenerator::generate(&roster, &first, date(2024, 3, 28));
        assert!(again.is_empty());
    }

    #[test]
    fn inactive_students_are_skipped() {
        let mut archived = student("1", 10);
        archived.status = StudentStatus::Inactive;
        let generated = ObligationGenerator::generate([&archived], &[], date(2024, 3, 5));
        assert!(generated.is_empty());
    }

    #[test]
    fn duplicate_roster_entries_yield_one_obligation() {
        let a = student("1", 10);
        let b = student("1", 10);
        let generated = ObligationGenerator::generate([&a, &b], &[], date(2024, 3, 5));
        assert_eq!(generated.len(), 1);
    }
}
