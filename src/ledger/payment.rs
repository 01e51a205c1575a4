use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    calendar::MonthKey,
    status::{Billable, BillingStatus},
};

/// A tuition obligation for one student and one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub student_id: String,
    /// Name captured when the obligation was generated; not re-synced later.
    pub student_name: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub status: BillingStatus,
}

impl Payment {
    /// Deterministic identifier of the obligation for `student_id` in `month`.
    pub fn obligation_id(student_id: &str, month: MonthKey) -> String {
        format!("{}-{}-{:02}", student_id, month.year, month.month)
    }

    pub fn is_paid(&self) -> bool {
        self.status == BillingStatus::Paid
    }

    /// Records settlement on `date`. Callers must reject already-paid payments.
    pub fn mark_paid(&mut self, date: NaiveDate) {
        self.payment_date = Some(date);
        self.status = BillingStatus::Paid;
    }
}

impl Billable for Payment {
    fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn status(&self) -> BillingStatus {
        self.status
    }

    fn payment_date(&self) -> Option<NaiveDate> {
        self.payment_date
    }

    fn set_status(&mut self, status: BillingStatus) {
        self.status = status;
    }
}
