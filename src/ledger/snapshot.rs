use serde::{Deserialize, Serialize};

use super::{
    budget::Budgets, expense::Expense, payment::Payment, student::Registration, student::Student,
};

/// The four persisted collections, compared structurally before every write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registrations: Vec<Registration>,
    pub payments: Vec<Payment>,
    pub expenses: Vec<Expense>,
    pub budgets: Budgets,
}

impl Snapshot {
    pub fn students(&self) -> impl Iterator<Item = &Student> + '_ {
        self.registrations.iter().map(|reg| &reg.student)
    }

    pub fn active_students(&self) -> impl Iterator<Item = &Student> + '_ {
        self.students().filter(|student| student.is_active())
    }

    pub fn registration(&self, student_id: &str) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|reg| reg.student.id == student_id)
    }

    pub fn registration_mut(&mut self, student_id: &str) -> Option<&mut Registration> {
        self.registrations
            .iter_mut()
            .find(|reg| reg.student.id == student_id)
    }

    pub fn payment(&self, id: &str) -> Option<&Payment> {
        self.payments.iter().find(|payment| payment.id == id)
    }

    pub fn payment_mut(&mut self, id: &str) -> Option<&mut Payment> {
        self.payments.iter_mut().find(|payment| payment.id == id)
    }

    pub fn expense(&self, id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    pub fn expense_mut(&mut self, id: &str) -> Option<&mut Expense> {
        self.expenses.iter_mut().find(|expense| expense.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Guardian, StudentStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn active_students_skip_archived_entries() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut archived = Student::new("Juliana Costa", dec!(220), 15, created);
        archived.status = StudentStatus::Inactive;
        let snapshot = Snapshot {
            registrations: vec![
                Registration::new(
                    Student::new("Lucas Almeida", dec!(250), 10, created),
                    Guardian::new("Fernanda Almeida"),
                ),
                Registration::new(archived, Guardian::new("Ricardo Costa")),
            ],
            ..Snapshot::default()
        };
        let names: Vec<&str> = snapshot
            .active_students()
            .map(|student| student.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["Lucas Almeida"]);
        assert_eq!(snapshot.students().count(), 2);
    }
}
