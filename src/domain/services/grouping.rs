use crate::domain::model::{ExpenseLine, TransactionLine};
use crate::domain::services::currency::ConvertedExpense;
use crate::domain::services::members::MemberDirectory;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const RECENT_TRANSACTION_LIMIT: usize = 10;

/// Folds rows sharing a transaction group into one line, in first-seen order.
///
/// Date, description and category come from the group's first row; all rows
/// in a group are logged together and share them.
pub fn group_transactions(
    expenses: &[ConvertedExpense<'_>],
    directory: &MemberDirectory<'_>,
) -> Vec<TransactionLine> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut lines: Vec<TransactionLine> = Vec::new();

    for converted in expenses {
        let expense = converted.expense;
        let payee = directory.label(&expense.payee_id);

        let position = *index.entry(expense.group_key()).or_insert_with(|| {
            lines.push(TransactionLine {
                group_id: expense.group_key().to_string(),
                description: expense.description.clone(),
                category: expense.category_label().to_string(),
                date: expense.expense_date,
                payees: Vec::new(),
                total: 0.0,
                rows: 0,
            });
            lines.len() - 1
        });

        let line = &mut lines[position];
        line.total += converted.amount;
        line.rows += 1;
        if !line.payees.iter().any(|name| name == payee) {
            line.payees.push(payee.to_string());
        }
    }

    lines
}

/// Newest first, undated lines last, at most `limit` lines.
pub fn recent_transactions(lines: &[TransactionLine], limit: usize) -> Vec<TransactionLine> {
    let mut sorted = lines.to_vec();
    sorted.sort_by(|left, right| match (left.date, right.date) {
        (Some(l), Some(r)) => r.cmp(&l),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted.truncate(limit);
    sorted
}

/// One detail line per expense row, newest first.
pub fn expense_lines(
    expenses: &[ConvertedExpense<'_>],
    directory: &MemberDirectory<'_>,
) -> Vec<ExpenseLine> {
    let mut lines: Vec<ExpenseLine> = expenses
        .iter()
        .map(|converted| {
            let expense = converted.expense;
            ExpenseLine {
                expense_id: expense.id.clone(),
                date: expense.expense_date,
                description: expense.description.clone(),
                payee: directory.label(&expense.payee_id).to_string(),
                category: expense.category_label().to_string(),
                payers: expense
                    .payers
                    .iter()
                    .map(|payer| directory.label(payer).to_string())
                    .collect(),
                original_amount: expense.amount,
                original_currency: expense.currency.clone(),
                converted_amount: converted.amount,
            }
        })
        .collect();

    // sort_by 為穩定排序，同一天的資料保持輸入順序
    lines.sort_by(|left, right| right.date.cmp(&left.date));
    lines
}
