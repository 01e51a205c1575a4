use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enrollment state of a student; only active students are billed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
        })
    }
}

/// A tutored student together with the billing terms agreed at enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub school_grade: String,
    #[serde(default)]
    pub subjects_of_interest: Vec<String>,
    #[serde(default)]
    pub learning_difficulties: String,
    pub monthly_fee: Decimal,
    pub payment_due_day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub status: StudentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl Student {
    /// Creates an active student with a freshly minted identifier.
    pub fn new(
        full_name: impl Into<String>,
        monthly_fee: Decimal,
        payment_due_day: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.into(),
            birth_date: None,
            school_grade: String::new(),
            subjects_of_interest: Vec::new(),
            learning_difficulties: String::new(),
            monthly_fee,
            payment_due_day,
            photo_url: None,
            status: StudentStatus::Active,
            created_at,
            status_changed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

/// Person responsible for the student's tuition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub full_name: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub document_id: String,
}

impl Guardian {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Self::default()
        }
    }
}

/// A student paired with their guardian, as stored in the roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    pub student: Student,
    pub guardian: Guardian,
}

impl Registration {
    pub fn new(student: Student, guardian: Guardian) -> Self {
        Self { student, guardian }
    }
}

/// Validated registration fields supplied by the input boundary.
///
/// The roster assigns `id`, `createdAt`, `status` and `photoUrl` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub school_grade: String,
    pub subjects_of_interest: Vec<String>,
    pub learning_difficulties: String,
    pub monthly_fee: Decimal,
    /// Zero means "use the configured default due day".
    pub payment_due_day: u32,
}

impl StudentDraft {
    pub fn new(full_name: impl Into<String>, monthly_fee: Decimal, payment_due_day: u32) -> Self {
        Self {
            full_name: full_name.into(),
            birth_date: None,
            school_grade: String::new(),
            subjects_of_interest: Vec::new(),
            learning_difficulties: String::new(),
            monthly_fee,
            payment_due_day,
        }
    }
}
