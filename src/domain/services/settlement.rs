use crate::domain::model::{Expense, Member, SettlementReport};
use crate::domain::services::aggregates;
use crate::domain::services::balance::compute_balances;
use crate::domain::services::currency::{convert_expenses, RateTable};
use crate::domain::services::grouping::{
    expense_lines, group_transactions, recent_transactions, RECENT_TRANSACTION_LIMIT,
};
use crate::domain::services::members::MemberDirectory;
use crate::domain::services::policy::{detect_anomalies, AnomalyLog, SettlementPolicy};
use crate::utils::error::Result;

/// Computes balances and spending aggregates for a snapshot of a trip.
///
/// Holds no state between calls: every report is derived from its arguments
/// and the rate table alone.
#[derive(Debug, Clone)]
pub struct SettlementEngine<'r> {
    rates: &'r RateTable,
    policy: SettlementPolicy,
}

impl<'r> SettlementEngine<'r> {
    pub fn new(rates: &'r RateTable) -> Self {
        Self {
            rates,
            policy: SettlementPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    /// `expenses` are expected to be scoped by the caller already.
    pub fn compute(
        &self,
        members: &[Member],
        expenses: &[Expense],
        display_currency: &str,
    ) -> Result<SettlementReport> {
        let directory = MemberDirectory::new(members);

        let mut log = AnomalyLog::new(self.policy);
        for anomaly in detect_anomalies(expenses, &directory, self.rates, display_currency) {
            log.report(anomaly)?;
        }

        let converted = convert_expenses(expenses, display_currency, self.rates);

        let transactions = group_transactions(&converted, &directory);
        let recent = recent_transactions(&transactions, RECENT_TRANSACTION_LIMIT);

        let report = SettlementReport {
            display_currency: display_currency.to_string(),
            balances: compute_balances(&converted, &directory),
            by_category: aggregates::by_category(&converted),
            by_payee: aggregates::by_payee(&converted, &directory),
            by_payer_share: aggregates::by_payer_share(&converted, &directory),
            by_day: aggregates::by_day(&converted),
            transactions,
            recent_transactions: recent,
            expense_lines: expense_lines(&converted, &directory),
            grand_total: aggregates::grand_total(&converted),
            anomalies: log.into_anomalies(),
        };

        tracing::debug!(
            "Settled {} expenses across {} members: total {:.2} {}",
            expenses.len(),
            members.len(),
            report.grand_total,
            display_currency
        );

        Ok(report)
    }
}
