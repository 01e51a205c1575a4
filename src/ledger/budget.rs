use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{amount, expense::ExpenseCategory};

/// Monthly spending ceilings, one per expense category.
///
/// A zero ceiling means no ceiling has been set. Persisted as a map keyed by
/// category; categories missing from stored data load as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ExpenseCategory, Decimal>",
    into = "BTreeMap<ExpenseCategory, Decimal>"
)]
pub struct Budgets {
    limits: [Decimal; ExpenseCategory::COUNT],
}

impl Budgets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: ExpenseCategory) -> Decimal {
        self.limits[category.index()]
    }

    /// Sets a ceiling; negative amounts are stored as zero.
    pub fn set(&mut self, category: ExpenseCategory, amount: Decimal) {
        self.limits[category.index()] = amount.max(Decimal::ZERO);
    }

    pub fn with(mut self, category: ExpenseCategory, amount: Decimal) -> Self {
        self.set(category, amount);
        self
    }

    /// Iterates every category with its ceiling, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ExpenseCategory, Decimal)> + '_ {
        ExpenseCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    pub fn total(&self) -> Decimal {
        amount::total(self.limits)
    }
}

impl From<BTreeMap<ExpenseCategory, Decimal>> for Budgets {
    fn from(map: BTreeMap<ExpenseCategory, Decimal>) -> Self {
        let mut budgets = Budgets::default();
        for (category, amount) in map {
            budgets.set(category, amount);
        }
        budgets
    }
}

impl From<Budgets> for BTreeMap<ExpenseCategory, Decimal> {
    fn from(budgets: Budgets) -> Self {
        budgets.iter().collect()
    }
}
