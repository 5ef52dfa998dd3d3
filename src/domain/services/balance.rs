use crate::domain::model::MemberBalance;
use crate::domain::services::currency::ConvertedExpense;
use crate::domain::services::members::MemberDirectory;

/// Folds converted expenses into one balance per member, in member-list order.
///
/// The payee is credited the full converted amount and every payer is charged
/// an equal share of it. Ids missing from the directory are skipped rather
/// than given a fabricated balance. An expense without payers charges nobody.
pub fn compute_balances(
    expenses: &[ConvertedExpense<'_>],
    directory: &MemberDirectory<'_>,
) -> Vec<MemberBalance> {
    let mut balances: Vec<MemberBalance> = directory
        .members()
        .iter()
        .map(MemberBalance::zeroed)
        .collect();

    for converted in expenses {
        let expense = converted.expense;

        if let Some(position) = directory.position(&expense.payee_id) {
            balances[position].total_paid += converted.amount;
        }

        let share = converted.share();
        for payer in &expense.payers {
            if let Some(position) = directory.position(payer) {
                balances[position].total_owed += share;
            }
        }
    }

    for balance in &mut balances {
        balance.net_balance = balance.total_paid - balance.total_owed;
    }

    balances
}

pub fn net_total(balances: &[MemberBalance]) -> f64 {
    balances.iter().map(|balance| balance.net_balance).sum()
}
