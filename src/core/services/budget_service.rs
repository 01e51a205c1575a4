//! Budget ceilings and per-category spend analysis.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::ledger::{amount, Budgets, Expense, ExpenseCategory, MonthKey, Snapshot};

/// Budget vs actual spend for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetVariance {
    pub category: ExpenseCategory,
    pub budgeted: Decimal,
    pub actual: Decimal,
    /// `budgeted - actual`; negative when over budget.
    pub diff: Decimal,
    /// Share of the ceiling already spent; zero when no ceiling is set.
    pub percent: Decimal,
}

impl BudgetVariance {
    pub fn is_over_budget(&self) -> bool {
        self.diff < Decimal::ZERO
    }
}

/// Spend for one category and its share of the month's total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpend {
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub percentage: Decimal,
}

/// Stateless budgeting utilities that operate over expense snapshots.
pub struct BudgetService;

impl BudgetService {
    /// Replaces every ceiling at once.
    pub fn set_budgets(snapshot: &mut Snapshot, budgets: Budgets) {
        snapshot.budgets = budgets;
        info!(total = %budgets.total(), "budgets updated");
    }

    /// Expenses whose due date falls in `month`, regardless of status.
    pub fn expenses_for_month(expenses: &[Expense], month: MonthKey) -> Vec<&Expense> {
        expenses
            .iter()
            .filter(|expense| month.contains(expense.due_date))
            .collect()
    }

    /// Variance of `category` against the supplied month's expenses.
    pub fn budget_variance<'a>(
        budgets: &Budgets,
        expenses: impl IntoIterator<Item = &'a Expense>,
        category: ExpenseCategory,
    ) -> BudgetVariance {
        let budgeted = budgets.get(category);
        let actual = amount::total(
            expenses
                .into_iter()
                .filter(|expense| expense.category == category)
                .map(|expense| expense.amount),
        );
        BudgetVariance {
            category,
            budgeted,
            actual,
            diff: amount::difference(budgeted, actual),
            percent: percent_of(actual, budgeted),
        }
    }

    /// Variance for every category in `month`, most consumed ceiling first.
    pub fn budget_report(
        budgets: &Budgets,
        expenses: &[Expense],
        month: MonthKey,
    ) -> Vec<BudgetVariance> {
        let month_expenses = Self::expenses_for_month(expenses, month);
        let mut report: Vec<BudgetVariance> = ExpenseCategory::ALL
            .into_iter()
            .map(|category| {
                Self::budget_variance(budgets, month_expenses.iter().copied(), category)
            })
            .collect();
        report.sort_by(|a, b| b.percent.cmp(&a.percent));
        report
    }

    /// Spend per category with its share of the total; categories without
    /// spend are omitted and the rest sorted by amount, largest first.
    pub fn expense_distribution<'a>(
        expenses: impl IntoIterator<Item = &'a Expense>,
    ) -> Vec<CategorySpend> {
        let mut totals = [Decimal::ZERO; ExpenseCategory::COUNT];
        for expense in expenses {
            let slot = &mut totals[expense.category.index()];
            *slot = slot.saturating_add(expense.amount);
        }
        let grand_total = amount::total(totals);
        let mut distribution: Vec<CategorySpend> = ExpenseCategory::ALL
            .into_iter()
            .filter(|category| totals[category.index()] > Decimal::ZERO)
            .map(|category| {
                let amount = totals[category.index()];
                CategorySpend {
                    category,
                    amount,
                    percentage: percent_of(amount, grand_total),
                }
            })
            .collect();
        distribution.sort_by(|a, b| b.amount.cmp(&a.amount));
        distribution
    }
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}
