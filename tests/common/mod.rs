#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;
use tuition_core::{
    core::BillingManager,
    ledger::{FixedClock, Guardian, Registration, Student, StudentStatus},
    storage::JsonStorage,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Student with a fixed id, created at the start of 2024.
pub fn student(id: &str, fee: Decimal, due_day: u32) -> Student {
    let created = Utc
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    let mut student = Student::new(format!("Student {id}"), fee, due_day, created);
    student.id = id.into();
    student
}

pub fn inactive(mut student: Student) -> Student {
    student.status = StudentStatus::Inactive;
    student
}

pub fn registration(student: Student) -> Registration {
    Registration::new(student, Guardian::new("Guardian"))
}

/// Creates an isolated data directory; keep the guard alive for the test's duration.
pub fn temp_home() -> TempDir {
    TempDir::new().expect("create temp dir")
}

/// Opens a JSON-backed manager under `home` pinned to `today`.
pub fn open_json(home: &TempDir, today: NaiveDate) -> BillingManager {
    let storage = JsonStorage::new(home.path().join("data")).expect("create json storage");
    BillingManager::open(Box::new(storage), Box::new(FixedClock::on(today)))
        .expect("open billing manager")
}
