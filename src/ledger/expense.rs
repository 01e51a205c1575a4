use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{Billable, BillingStatus};

/// Closed set of business expense categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Salaries,
    Marketing,
    Supplies,
    Rent,
    Utilities,
    SoftwareSubscriptions,
    ProfessionalDevelopment,
    Travel,
    Taxes,
    ThirdPartyServices,
    Other,
}

impl ExpenseCategory {
    pub const COUNT: usize = 11;

    /// Every category in display order.
    pub const ALL: [ExpenseCategory; Self::COUNT] = [
        ExpenseCategory::Salaries,
        ExpenseCategory::Marketing,
        ExpenseCategory::Supplies,
        ExpenseCategory::Rent,
        ExpenseCategory::Utilities,
        ExpenseCategory::SoftwareSubscriptions,
        ExpenseCategory::ProfessionalDevelopment,
        ExpenseCategory::Travel,
        ExpenseCategory::Taxes,
        ExpenseCategory::ThirdPartyServices,
        ExpenseCategory::Other,
    ];

    /// Position of the category in [`ExpenseCategory::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Supplies => "Supplies",
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::SoftwareSubscriptions => "Software Subscriptions",
            ExpenseCategory::ProfessionalDevelopment => "Professional Development",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Taxes => "Taxes",
            ExpenseCategory::ThirdPartyServices => "Third-Party Services",
            ExpenseCategory::Other => "Other",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ExpenseCategory::Salaries => "salaries",
            ExpenseCategory::Marketing => "marketing",
            ExpenseCategory::Supplies => "supplies",
            ExpenseCategory::Rent => "rent",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::SoftwareSubscriptions => "software_subscriptions",
            ExpenseCategory::ProfessionalDevelopment => "professional_development",
            ExpenseCategory::Travel => "travel",
            ExpenseCategory::Taxes => "taxes",
            ExpenseCategory::ThirdPartyServices => "third_party_services",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown expense category `{0}`")]
pub struct ParseCategoryError(String);

impl FromStr for ExpenseCategory {
    type Err = ParseCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ExpenseCategory::ALL
            .into_iter()
            .find(|category| category.slug() == needle)
            .ok_or_else(|| ParseCategoryError(value.to_string()))
    }
}

/// An accounts-payable entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub status: BillingStatus,
}

impl Expense {
    /// Creates a pending expense from validated fields.
    pub fn from_draft(draft: ExpenseDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: draft.description,
            amount: draft.amount,
            category: draft.category,
            due_date: draft.due_date,
            payment_date: None,
            status: BillingStatus::Pending,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == BillingStatus::Paid
    }

    pub fn mark_paid(&mut self, date: NaiveDate) {
        self.payment_date = Some(date);
        self.status = BillingStatus::Paid;
    }
}

impl Billable for Expense {
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

/// Editable expense fields accepted by create and update commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub due_date: NaiveDate,
}

impl ExpenseDraft {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        category: ExpenseCategory,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category,
            due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_index_matches_display_order() {
        for (position, category) in ExpenseCategory::ALL.into_iter().enumerate() {
            assert_eq!(category.index(), position);
        }
    }

    #[test]
    fn category_parses_slugs_and_labels() {
        assert_eq!(
            "software-subscriptions".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::SoftwareSubscriptions
        );
        assert_eq!(
            "Third Party Services".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::ThirdPartyServices
        );
        assert!("groceries".parse::<ExpenseCategory>().is_err());
    }
}
