//! Billing domain models and the calendar helpers they depend on.

pub mod amount;
pub mod budget;
pub mod calendar;
pub mod expense;
pub mod payment;
pub mod snapshot;
pub mod status;
pub mod student;

pub use budget::Budgets;
pub use calendar::{
    days_in_month, due_date_in, month_key, start_of_day, Clock, FixedClock, MonthKey, SystemClock,
};
pub use expense::{Expense, ExpenseCategory, ExpenseDraft};
pub use payment::Payment;
pub use snapshot::Snapshot;
pub use status::{Billable, BillingStatus};
pub use student::{Guardian, Registration, Student, StudentDraft, StudentStatus};
