//! Accounts-payable commands.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::errors::{LedgerError, Result};
use crate::ledger::{Expense, ExpenseDraft, Snapshot};

/// Provides validated create/update/delete/settle operations for expenses.
pub struct ExpenseService;

impl ExpenseService {
    /// Records a new pending expense and returns its identifier.
    pub fn create(snapshot: &mut Snapshot, draft: ExpenseDraft) -> String {
        let expense = Expense::from_draft(draft);
        let id = expense.id.clone();
        info!(expense = %id, category = %expense.category, amount = %expense.amount, "expense recorded");
        snapshot.expenses.push(expense);
        sort_by_due_date(&mut snapshot.expenses);
        id
    }

    /// Replaces the editable fields of an existing expense.
    ///
    /// Status is preserved. A paid expense keeps its amount.
    pub fn update(snapshot: &mut Snapshot, id: &str, draft: ExpenseDraft) -> Result<()> {
        let expense = snapshot
            .expense_mut(id)
            .ok_or_else(|| LedgerError::not_found("Expense", id))?;
        if expense.is_paid() && expense.amount != draft.amount {
            warn!(expense = %id, "rejected amount change on paid expense");
            return Err(LedgerError::InvalidOperation(format!(
                "expense `{id}` is paid; its amount cannot change"
            )));
        }
        expense.description = draft.description;
        expense.amount = draft.amount;
        expense.category = draft.category;
        expense.due_date = draft.due_date;
        sort_by_due_date(&mut snapshot.expenses);
        Ok(())
    }

    pub fn delete(snapshot: &mut Snapshot, id: &str) -> Result<()> {
        let before = snapshot.expenses.len();
        snapshot.expenses.retain(|expense| expense.id != id);
        if snapshot.expenses.len() == before {
            return Err(LedgerError::not_found("Expense", id));
        }
        info!(expense = %id, "expense deleted");
        Ok(())
    }

    /// Settles an open expense on `date`; paying twice is rejected.
    pub fn mark_paid(snapshot: &mut Snapshot, id: &str, date: NaiveDate) -> Result<()> {
        let expense = snapshot
            .expense_mut(id)
            .ok_or_else(|| LedgerError::not_found("Expense", id))?;
        if expense.is_paid() {
            warn!(expense = %id, "rejected repeated payment");
            return Err(LedgerError::InvalidOperation(format!(
                "expense `{id}` is already paid"
            )));
        }
        expense.mark_paid(date);
        info!(expense = %id, %date, "expense paid");
        Ok(())
    }
}

/// Most recent due date first.
fn sort_by_due_date(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.due_date.cmp(&a.due_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BillingStatus, ExpenseCategory};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(amount: rust_decimal::Decimal, due: NaiveDate) -> ExpenseDraft {
        ExpenseDraft::new("Pens and workbooks", amount, ExpenseCategory::Supplies, due)
    }

    #[test]
    fn create_starts_pending_and_keeps_newest_first() {
        let mut snapshot = Snapshot::default();
        let older = ExpenseService::create(&mut snapshot, draft(dec!(50), date(2024, 3, 1)));
        let newer = ExpenseService::create(&mut snapshot, draft(dec!(80), date(2024, 3, 20)));
        assert_eq!(snapshot.expenses[0].id, newer);
        assert_eq!(snapshot.expenses[1].id, older);
        assert!(snapshot
            .expenses
            .iter()
            .all(|e| e.status == BillingStatus::Pending && e.payment_date.is_none()));
    }

    #[test]
    fn update_rejects_amount_change_after_payment() {
        let mut snapshot = Snapshot::default();
        let id = ExpenseService::create(&mut snapshot, draft(dec!(150), date(2024, 3, 5)));
        ExpenseService::mark_paid(&mut snapshot, &id, date(2024, 3, 4)).unwrap();

        let err = ExpenseService::update(&mut snapshot, &id, draft(dec!(175), date(2024, 3, 5)))
            .expect_err("amount is immutable once paid");
        assert!(matches!(err, LedgerError::InvalidOperation(_)));

        let mut relabeled = draft(dec!(150), date(2024, 3, 5));
        relabeled.description = "Workbooks".into();
        ExpenseService::update(&mut snapshot, &id, relabeled).unwrap();
        let stored = snapshot.expense(&id).unwrap();
        assert_eq!(stored.description, "Workbooks");
        assert_eq!(stored.status, BillingStatus::Paid);
    }

    #[test]
    fn update_keeps_overdue_status() {
        let mut snapshot = Snapshot::default();
        let id = ExpenseService::create(&mut snapshot, draft(dec!(150), date(2024, 3, 5)));
        snapshot.expense_mut(&id).unwrap().status = BillingStatus::Overdue;
        ExpenseService::update(&mut snapshot, &id, draft(dec!(160), date(2024, 4, 5))).unwrap();
        let stored = snapshot.expense(&id).unwrap();
        assert_eq!(stored.status, BillingStatus::Overdue);
        assert_eq!(stored.amount, dec!(160));
    }

    #[test]
    fn delete_and_repeat_payment_report_errors() {
        let mut snapshot = Snapshot::default();
        let id = ExpenseService::create(&mut snapshot, draft(dec!(99), date(2024, 3, 5)));
        ExpenseService::mark_paid(&mut snapshot, &id, date(2024, 3, 5)).unwrap();
        assert!(ExpenseService::mark_paid(&mut snapshot, &id, date(2024, 3, 6)).is_err());
        ExpenseService::delete(&mut snapshot, &id).unwrap();
        assert!(matches!(
            ExpenseService::delete(&mut snapshot, &id),
            Err(LedgerError::NotFound { kind: "Expense", .. })
        ));
    }
}
