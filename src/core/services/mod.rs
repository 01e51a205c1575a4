pub mod budget_service;
pub mod expense_service;
pub mod payment_service;
pub mod student_service;
pub mod summary_service;

pub use budget_service::{BudgetService, BudgetVariance, CategorySpend};
pub use expense_service::ExpenseService;
pub use payment_service::PaymentService;
pub use student_service::{RosterFilter, StudentService};
pub use summary_service::{
    Dashboard, ExpenseFilter, MonthlyRevenue, StudentStats, SummaryService, Tally,
};
