use crate::domain::model::{Category, Expense, MemberId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Narrows the expenses a report covers. Unset criteria match everything.
///
/// Dates are UTC calendar days and both bounds are inclusive. An expense
/// without a date never satisfies a date bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub payee_id: Option<MemberId>,
    pub payer_id: Option<MemberId>,
    pub category: Option<Category>,
}

impl ExpenseFilter {
    pub fn is_empty(&self) -> bool {
        self == &ExpenseFilter::default()
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(payee_id) = &self.payee_id {
            if &expense.payee_id != payee_id {
                return false;
            }
        }

        if let Some(category) = self.category {
            if expense.category != Some(category) {
                return false;
            }
        }

        if let Some(payer_id) = &self.payer_id {
            if !expense.payers.contains(payer_id) {
                return false;
            }
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(day) = expense.expense_day() else {
                return false;
            };
            if self.start_date.is_some_and(|start| day < start) {
                return false;
            }
            if self.end_date.is_some_and(|end| day > end) {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, expenses: &[Expense]) -> Vec<Expense> {
        expenses
            .iter()
            .filter(|expense| self.matches(expense))
            .cloned()
            .collect()
    }
}
