//! Roster mutations: registration, bulk import, edits and enrollment status changes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::ledger::{Guardian, Registration, Snapshot, Student, StudentDraft, StudentStatus};

/// Criteria for the roster list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    /// `None` matches both active and archived students.
    pub status: Option<StudentStatus>,
    /// Case-insensitive substring of the student's or the guardian's name.
    pub search: Option<String>,
}

impl RosterFilter {
    pub fn matches(&self, registration: &Registration) -> bool {
        let status_ok = self
            .status
            .map_or(true, |status| registration.student.status == status);
        let search_ok = self.search.as_deref().map_or(true, |needle| {
            let needle = needle.to_lowercase();
            registration.student.full_name.to_lowercase().contains(&needle)
                || registration.guardian.full_name.to_lowercase().contains(&needle)
        });
        status_ok && search_ok
    }
}

/// Provides validated mutations for the student roster.
pub struct StudentService;

impl StudentService {
    /// Registrations matching `filter`, in roster order.
    pub fn search<'a>(
        registrations: &'a [Registration],
        filter: &RosterFilter,
    ) -> Vec<&'a Registration> {
        registrations
            .iter()
            .filter(|registration| filter.matches(registration))
            .collect()
    }

    /// Adds a new active student and returns the assigned identifier.
    ///
    /// A due day of zero falls back to `default_due_day`.
    pub fn register(
        snapshot: &mut Snapshot,
        draft: StudentDraft,
        guardian: Guardian,
        now: DateTime<Utc>,
        default_due_day: u32,
    ) -> Result<String> {
        validate(&draft, &guardian)?;
        Ok(insert(snapshot, draft, guardian, now, default_due_day))
    }

    /// Registers every pair, or none of them when any pair is invalid.
    ///
    /// Imported students appear at the top of the roster in input order.
    pub fn import(
        snapshot: &mut Snapshot,
        rows: Vec<(StudentDraft, Guardian)>,
        now: DateTime<Utc>,
        default_due_day: u32,
    ) -> Result<Vec<String>> {
        for (position, (draft, guardian)) in rows.iter().enumerate() {
            validate(draft, guardian).map_err(|err| {
                LedgerError::InvalidOperation(format!("import row {}: {err}", position + 1))
            })?;
        }
        let count = rows.len();
        let ids: Vec<String> = rows
            .into_iter()
            .rev()
            .map(|(draft, guardian)| insert(snapshot, draft, guardian, now, default_due_day))
            .collect();
        info!(count, "imported registrations");
        Ok(ids.into_iter().rev().collect())
    }

    /// Replaces the editable fields of a registration.
    ///
    /// Identity, creation time, photo and enrollment status are preserved;
    /// already generated obligations keep the fee and name they were created with.
    pub fn update(
        snapshot: &mut Snapshot,
        id: &str,
        draft: StudentDraft,
        guardian: Guardian,
    ) -> Result<()> {
        validate(&draft, &guardian)?;
        let registration = snapshot
            .registration_mut(id)
            .ok_or_else(|| LedgerError::not_found("Student", id))?;
        let student = &mut registration.student;
        student.full_name = draft.full_name;
        student.birth_date = draft.birth_date;
        student.school_grade = draft.school_grade;
        student.subjects_of_interest = draft.subjects_of_interest;
        student.learning_difficulties = draft.learning_difficulties;
        student.monthly_fee = draft.monthly_fee;
        if draft.payment_due_day != 0 {
            student.payment_due_day = draft.payment_due_day;
        }
        registration.guardian = guardian;
        Ok(())
    }

    /// Moves a student between active and inactive, stamping the change time.
    ///
    /// Returns `false` when the student already had the requested status.
    pub fn change_status(
        snapshot: &mut Snapshot,
        id: &str,
        status: StudentStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let registration = snapshot
            .registration_mut(id)
            .ok_or_else(|| LedgerError::not_found("Student", id))?;
        let student = &mut registration.student;
        if student.status == status {
            return Ok(false);
        }
        student.status = status;
        student.status_changed_at = Some(now);
        info!(student = %id, %status, "student status changed");
        Ok(true)
    }
}

fn validate(draft: &StudentDraft, guardian: &Guardian) -> Result<()> {
    if draft.full_name.trim().is_empty() {
        return Err(LedgerError::InvalidOperation(
            "student name must not be empty".into(),
        ));
    }
    if guardian.full_name.trim().is_empty() {
        return Err(LedgerError::InvalidOperation(format!(
            "guardian name for `{}` must not be empty",
            draft.full_name
        )));
    }
    if draft.monthly_fee < Decimal::ZERO {
        return Err(LedgerError::InvalidOperation(format!(
            "monthly fee for `{}` must not be negative",
            draft.full_name
        )));
    }
    if draft.payment_due_day > 31 {
        return Err(LedgerError::InvalidOperation(format!(
            "due day for `{}` must be 1-31, got {}",
            draft.full_name, draft.payment_due_day
        )));
    }
    Ok(())
}

fn insert(
    snapshot: &mut Snapshot,
    draft: StudentDraft,
    guardian: Guardian,
    now: DateTime<Utc>,
    default_due_day: u32,
) -> String {
    let id = Uuid::new_v4().to_string();
    let due_day = if draft.payment_due_day == 0 {
        default_due_day
    } else {
        draft.payment_due_day
    };
    let student = Student {
        id: id.clone(),
        full_name: draft.full_name,
        birth_date: draft.birth_date,
        school_grade: draft.school_grade,
        subjects_of_interest: draft.subjects_of_interest,
        learning_difficulties: draft.learning_difficulties,
        monthly_fee: draft.monthly_fee,
        payment_due_day: due_day,
        photo_url: None,
        status: StudentStatus::Active,
        created_at: now,
        status_changed_at: None,
    };
    info!(student = %id, name = %student.full_name, "registered student");
    snapshot
        .registrations
        .insert(0, Registration::new(student, guardian));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn register(snapshot: &mut Snapshot, name: &str, guardian: &str) -> String {
        StudentService::register(
            snapshot,
            StudentDraft::new(name, dec!(200), 10),
            Guardian::new(guardian),
            now(),
            10,
        )
        .unwrap()
    }

    #[test]
    fn register_defaults_due_day_and_activates() {
        let mut snapshot = Snapshot::default();
        let id = StudentService::register(
            &mut snapshot,
            StudentDraft::new("Pedro Oliveira", dec!(200), 0),
            Guardian::new("Márcia Oliveira"),
            now(),
            10,
        )
        .unwrap();
        let student = &snapshot.registration(&id).unwrap().student;
        assert_eq!(student.payment_due_day, 10);
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.created_at, now());
    }

    #[test]
    fn register_rejects_blank_names() {
        let mut snapshot = Snapshot::default();
        let err = StudentService::register(
            &mut snapshot,
            StudentDraft::new("  ", dec!(200), 10),
            Guardian::new("Márcia Oliveira"),
            now(),
            10,
        )
        .expect_err("blank student name");
        assert!(matches!(err, LedgerError::InvalidOperation(_)));
        assert!(snapshot.registrations.is_empty());
    }

    #[test]
    fn change_status_stamps_transition_once() {
        let mut snapshot = Snapshot::default();
        let id = register(&mut snapshot, "Juliana Costa", "Ricardo Costa");
        let later = Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap();
        assert!(
            StudentService::change_status(&mut snapshot, &id, StudentStatus::Inactive, later)
                .unwrap()
        );
        assert!(
            !StudentService::change_status(&mut snapshot, &id, StudentStatus::Inactive, now())
                .unwrap()
        );
        let student = &snapshot.registration(&id).unwrap().student;
        assert_eq!(student.status_changed_at, Some(later));
    }

    #[test]
    fn unknown_student_is_reported() {
        let mut snapshot = Snapshot::default();
        let err = StudentService::change_status(
            &mut snapshot,
            "missing",
            StudentStatus::Inactive,
            now(),
        )
        .expect_err("unknown student must fail");
        assert!(matches!(err, LedgerError::NotFound { kind: "Student", .. }));
    }

    #[test]
    fn search_matches_student_or_guardian_name() {
        let mut snapshot = Snapshot::default();
        register(&mut snapshot, "Lucas Almeida", "Fernanda Almeida");
        let juliana = register(&mut snapshot, "Juliana Costa", "Ricardo Costa");
        register(&mut snapshot, "Pedro Oliveira", "Márcia Oliveira");
        StudentService::change_status(&mut snapshot, &juliana, StudentStatus::Inactive, now())
            .unwrap();

        let by_guardian = RosterFilter {
            search: Some("RICARDO".into()),
            ..RosterFilter::default()
        };
        let found = StudentService::search(&snapshot.registrations, &by_guardian);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].student.full_name, "Juliana Costa");

        let active_oliveira = RosterFilter {
            status: Some(StudentStatus::Active),
            search: Some("oliveira".into()),
        };
        let found = StudentService::search(&snapshot.registrations, &active_oliveira);
        assert_eq!(found.len(), 1);

        let archived_almeida = RosterFilter {
            status: Some(StudentStatus::Inactive),
            search: Some("almeida".into()),
        };
        assert!(StudentService::search(&snapshot.registrations, &archived_almeida).is_empty());
        assert_eq!(
            StudentService::search(&snapshot.registrations, &RosterFilter::default()).len(),
            3
        );
    }

    #[test]
    fn import_keeps_input_order_at_top_of_roster() {
        let mut snapshot = Snapshot::default();
        let existing = register(&mut snapshot, "Lucas Almeida", "Fernanda Almeida");
        let ids = StudentService::import(
            &mut snapshot,
            vec![
                (
                    StudentDraft::new("Ana Souza", dec!(180), 0),
                    Guardian::new("Paulo Souza"),
                ),
                (
                    StudentDraft::new("Bruno Lima", dec!(210), 20),
                    Guardian::new("Carla Lima"),
                ),
            ],
            now(),
            10,
        )
        .unwrap();
        assert_eq!(ids.len(), 2);
        let names: Vec<&str> = snapshot
            .students()
            .map(|student| student.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["Ana Souza", "Bruno Lima", "Lucas Almeida"]);
        assert_eq!(snapshot.registrations[0].student.id, ids[0]);
        assert_eq!(snapshot.registrations[0].student.payment_due_day, 10);
        assert_eq!(snapshot.registrations[2].student.id, existing);
    }

    #[test]
    fn import_with_one_invalid_row_adds_nothing() {
        let mut snapshot = Snapshot::default();
        let err = StudentService::import(
            &mut snapshot,
            vec![
                (
                    StudentDraft::new("Ana Souza", dec!(180), 5),
                    Guardian::new("Paulo Souza"),
                ),
                (
                    StudentDraft::new("Bruno Lima", dec!(210), 5),
                    Guardian::new(""),
                ),
            ],
            now(),
            10,
        )
        .expect_err("second row lacks a guardian");
        assert!(err.to_string().contains("import row 2"));
        assert!(snapshot.registrations.is_empty());
    }
}
