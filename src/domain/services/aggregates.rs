use crate::domain::model::LabelTotal;
use crate::domain::services::currency::ConvertedExpense;
use crate::domain::services::members::MemberDirectory;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Sums values per label while remembering first-seen order.
#[derive(Debug, Default)]
struct OrderedTotals {
    index: HashMap<String, usize>,
    totals: Vec<LabelTotal>,
}

impl OrderedTotals {
    fn add(&mut self, label: &str, amount: f64) {
        match self.index.get(label) {
            Some(&position) => self.totals[position].total += amount,
            None => {
                self.index.insert(label.to_string(), self.totals.len());
                self.totals.push(LabelTotal {
                    label: label.to_string(),
                    total: amount,
                });
            }
        }
    }

    fn into_totals(self) -> Vec<LabelTotal> {
        self.totals
    }
}

/// 依分類加總，保留各標籤第一次出現的順序
pub fn by_category(expenses: &[ConvertedExpense<'_>]) -> Vec<LabelTotal> {
    let mut totals = OrderedTotals::default();
    for converted in expenses {
        totals.add(converted.expense.category_label(), converted.amount);
    }
    totals.into_totals()
}

/// Who fronted the money. Unresolved payees are grouped under `"Unknown"`.
pub fn by_payee(
    expenses: &[ConvertedExpense<'_>],
    directory: &MemberDirectory<'_>,
) -> Vec<LabelTotal> {
    let mut totals = OrderedTotals::default();
    for converted in expenses {
        totals.add(directory.label(&converted.expense.payee_id), converted.amount);
    }
    totals.into_totals()
}

/// Who consumed the spending: each payer is attributed an equal share.
/// Expenses without payers contribute nothing here.
pub fn by_payer_share(
    expenses: &[ConvertedExpense<'_>],
    directory: &MemberDirectory<'_>,
) -> Vec<LabelTotal> {
    let mut totals = OrderedTotals::default();
    for converted in expenses {
        let share = converted.share();
        for payer in &converted.expense.payers {
            totals.add(directory.label(payer), share);
        }
    }
    totals.into_totals()
}

/// Keyed by the UTC calendar day (`YYYY-MM-DD`). Undated expenses are left out.
pub fn by_day(expenses: &[ConvertedExpense<'_>]) -> Vec<LabelTotal> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for converted in expenses {
        if let Some(day) = converted.expense.expense_day() {
            *days.entry(day).or_insert(0.0) += converted.amount;
        }
    }

    days.into_iter()
        .map(|(day, total)| LabelTotal {
            label: day.format("%Y-%m-%d").to_string(),
            total,
        })
        .collect()
}

pub fn grand_total(expenses: &[ConvertedExpense<'_>]) -> f64 {
    expenses.iter().map(|converted| converted.amount).sum()
}

pub fn sum_totals(totals: &[LabelTotal]) -> f64 {
    totals.iter().map(|entry| entry.total).sum()
}
