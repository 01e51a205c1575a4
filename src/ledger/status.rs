use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement state shared by tuition payments and expenses.
///
/// Transitions only move forward: `Pending -> Overdue` happens with time,
/// `Pending | Overdue -> Paid` happens on an explicit payment, and `Paid` is final.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    #[default]
    Pending,
    Overdue,
    Paid,
}

impl BillingStatus {
    pub fn is_open(&self) -> bool {
        !matches!(self, BillingStatus::Paid)
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BillingStatus::Pending => "pending",
            BillingStatus::Overdue => "overdue",
            BillingStatus::Paid => "paid",
        })
    }
}

/// Common view over records that carry a due date, an amount and a status.
pub trait Billable {
    fn due_date(&self) -> NaiveDate;
    fn amount(&self) -> Decimal;
    fn status(&self) -> BillingStatus;
    fn payment_date(&self) -> Option<NaiveDate>;
    fn set_status(&mut self, status: BillingStatus);
}
