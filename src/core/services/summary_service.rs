//! Read-only financial aggregation over committed snapshots.
//!
//! Every query is a pure function of its inputs. Empty inputs produce zero
//! totals, and queries sum over whatever records exist without assuming one
//! obligation per student and month.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{
    amount,
    calendar::window_end, Billable, BillingStatus, Expense, MonthKey, Payment, Registration,
    Snapshot, Student, StudentStatus,
};

use super::budget_service::{BudgetService, BudgetVariance, CategorySpend};

const LATEST_REGISTRATIONS: usize = 5;

/// Number of records and their summed amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub count: usize,
    pub amount: Decimal,
}

impl Tally {
    fn of<'a, T: Billable + 'a>(records: impl IntoIterator<Item = &'a T>) -> Self {
        records.into_iter().fold(Tally::default(), |acc, record| Tally {
            count: acc.count + 1,
            amount: acc.amount.saturating_add(record.amount()),
        })
    }
}

/// Payments due in a month, with counts per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue<'a> {
    pub month: MonthKey,
    pub payments: Vec<&'a Payment>,
    pub paid: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl MonthlyRevenue<'_> {
    pub fn total(&self) -> usize {
        self.payments.len()
    }
}

/// Criteria for the accounts-payable list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// `None` matches every status.
    pub status: Option<BillingStatus>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        let status_ok = self.status.map_or(true, |status| expense.status == status);
        let search_ok = self.search.as_deref().map_or(true, |needle| {
            expense
                .description
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let from_ok = self.due_from.map_or(true, |from| expense.due_date >= from);
        let to_ok = self.due_to.map_or(true, |to| expense.due_date <= to);
        status_ok && search_ok && from_ok && to_ok
    }
}

/// Roster figures for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentStats<'a> {
    pub active: usize,
    pub new_this_month: usize,
    pub archived_this_month: usize,
    pub latest: Vec<&'a Registration>,
    /// Active students per subject of interest.
    pub subjects: BTreeMap<String, usize>,
}

/// Headline figures for the reference month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub month: MonthKey,
    pub revenue: Decimal,
    pub expenses_paid: Decimal,
    pub net_profit: Decimal,
    pub projected_revenue: Decimal,
    pub pending_revenue: Decimal,
    pub upcoming_payments: Tally,
    pub overdue_expenses: Tally,
    pub expenses_due_soon: Tally,
    pub budgets: Vec<BudgetVariance>,
    pub distribution: Vec<CategorySpend>,
}

/// Aggregates snapshot data for reporting views.
pub struct SummaryService;

impl SummaryService {
    /// Tuition received in `month`, by payment date.
    pub fn total_revenue(payments: &[Payment], month: MonthKey) -> Decimal {
        paid_in_month(payments, month)
    }

    /// Expenses settled in `month`, by payment date.
    pub fn total_expenses_paid(expenses: &[Expense], month: MonthKey) -> Decimal {
        paid_in_month(expenses, month)
    }

    pub fn net_profit(payments: &[Payment], expenses: &[Expense], month: MonthKey) -> Decimal {
        amount::difference(
            Self::total_revenue(payments, month),
            Self::total_expenses_paid(expenses, month),
        )
    }

    /// Monthly fees of every currently active student.
    pub fn projected_revenue<'a>(students: impl IntoIterator<Item = &'a Student>) -> Decimal {
        amount::total(
            students
                .into_iter()
                .filter(|student| student.is_active())
                .map(|student| student.monthly_fee),
        )
    }

    /// Open obligations due in `month`.
    pub fn pending_revenue(payments: &[Payment], month: MonthKey) -> Decimal {
        amount::total(
            payments
                .iter()
                .filter(|payment| payment.status.is_open() && month.contains(payment.due_date))
                .map(|payment| payment.amount),
        )
    }

    /// Unpaid obligations due between `reference` and `window_days` later, inclusive.
    pub fn upcoming_payments(payments: &[Payment], reference: NaiveDate, window_days: u32) -> Tally {
        let end = window_end(reference, window_days);
        Tally::of(payments.iter().filter(|payment| {
            payment.status.is_open() && payment.due_date >= reference && payment.due_date <= end
        }))
    }

    pub fn overdue_expenses(expenses: &[Expense]) -> Tally {
        Tally::of(
            expenses
                .iter()
                .filter(|expense| expense.status == BillingStatus::Overdue),
        )
    }

    /// Pending expenses due between `reference` and `window_days` later, inclusive.
    pub fn expenses_due_soon(expenses: &[Expense], reference: NaiveDate, window_days: u32) -> Tally {
        let end = window_end(reference, window_days);
        Tally::of(expenses.iter().filter(|expense| {
            expense.status == BillingStatus::Pending
                && expense.due_date >= reference
                && expense.due_date <= end
        }))
    }

    /// Payments due in `month` with their status breakdown.
    pub fn revenue_by_month(payments: &[Payment], month: MonthKey) -> MonthlyRevenue<'_> {
        let due: Vec<&Payment> = payments
            .iter()
            .filter(|payment| month.contains(payment.due_date))
            .collect();
        let count = |status: BillingStatus| due.iter().filter(|p| p.status == status).count();
        MonthlyRevenue {
            month,
            paid: count(BillingStatus::Paid),
            pending: count(BillingStatus::Pending),
            overdue: count(BillingStatus::Overdue),
            payments: due,
        }
    }

    pub fn filter_expenses<'a>(expenses: &'a [Expense], filter: &ExpenseFilter) -> Vec<&'a Expense> {
        expenses
            .iter()
            .filter(|expense| filter.matches(expense))
            .collect()
    }

    /// A student's obligations, most recent due date first.
    pub fn payment_history<'a>(payments: &'a [Payment], student_id: &str) -> Vec<&'a Payment> {
        let mut history: Vec<&Payment> = payments
            .iter()
            .filter(|payment| payment.student_id == student_id)
            .collect();
        history.sort_by(|a, b| b.due_date.cmp(&a.due_date));
        history
    }

    pub fn student_stats(registrations: &[Registration], month: MonthKey) -> StudentStats<'_> {
        let active = registrations
            .iter()
            .filter(|reg| reg.student.is_active())
            .count();
        let new_this_month = registrations
            .iter()
            .filter(|reg| month.contains(reg.student.created_at.date_naive()))
            .count();
        let archived_this_month = registrations
            .iter()
            .filter(|reg| reg.student.status == StudentStatus::Inactive)
            .filter_map(|reg| reg.student.status_changed_at)
            .filter(|changed| month.contains(changed.date_naive()))
            .count();

        let mut latest: Vec<&Registration> = registrations.iter().collect();
        latest.sort_by(|a, b| b.student.created_at.cmp(&a.student.created_at));
        latest.truncate(LATEST_REGISTRATIONS);

        let mut subjects = BTreeMap::new();
        for subject in registrations
            .iter()
            .filter(|reg| reg.student.is_active())
            .flat_map(|reg| reg.student.subjects_of_interest.iter())
        {
            *subjects.entry(subject.clone()).or_insert(0) += 1;
        }

        StudentStats {
            active,
            new_this_month,
            archived_this_month,
            latest,
            subjects,
        }
    }

    /// Headline figures for the month containing `reference`.
    pub fn dashboard(snapshot: &Snapshot, reference: NaiveDate, window_days: u32) -> Dashboard {
        let month = MonthKey::of(reference);
        let revenue = Self::total_revenue(&snapshot.payments, month);
        let expenses_paid = Self::total_expenses_paid(&snapshot.expenses, month);
        let month_expenses = BudgetService::expenses_for_month(&snapshot.expenses, month);
        Dashboard {
            month,
            revenue,
            expenses_paid,
            net_profit: amount::difference(revenue, expenses_paid),
            projected_revenue: Self::projected_revenue(snapshot.active_students()),
            pending_revenue: Self::pending_revenue(&snapshot.payments, month),
            upcoming_payments: Self::upcoming_payments(&snapshot.payments, reference, window_days),
            overdue_expenses: Self::overdue_expenses(&snapshot.expenses),
            expenses_due_soon: Self::expenses_due_soon(&snapshot.expenses, reference, window_days),
            budgets: BudgetService::budget_report(&snapshot.budgets, &snapshot.expenses, month),
            distribution: BudgetService::expense_distribution(month_expenses),
        }
    }
}

fn paid_in_month<T: Billable>(records: &[T], month: MonthKey) -> Decimal {
    amount::total(
        records
            .iter()
            .filter(|record| record.status() == BillingStatus::Paid)
            .filter(|record| record.payment_date().is_some_and(|date| month.contains(date)))
            .map(Billable::amount),
    )
}
