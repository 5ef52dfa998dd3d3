use crate::domain::model::{Anomaly, Expense, MemberRole};
use crate::domain::services::currency::RateTable;
use crate::domain::services::members::MemberDirectory;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 遇到未知幣別、沒有付款人或不存在的成員時的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyAction {
    /// Degrade silently.
    Allow,
    /// Degrade, log, and record the anomaly in the report.
    #[default]
    Warn,
    /// Fail the computation.
    Reject,
}

impl fmt::Display for AnomalyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyAction::Allow => f.write_str("allow"),
            AnomalyAction::Warn => f.write_str("warn"),
            AnomalyAction::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for AnomalyAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(AnomalyAction::Allow),
            "warn" => Ok(AnomalyAction::Warn),
            "reject" => Ok(AnomalyAction::Reject),
            other => Err(format!(
                "Unknown policy '{}'. Valid values: allow, warn, reject",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementPolicy {
    pub unknown_currency: AnomalyAction,
    pub empty_payers: AnomalyAction,
    pub dangling_member: AnomalyAction,
}

impl SettlementPolicy {
    pub fn uniform(action: AnomalyAction) -> Self {
        Self {
            unknown_currency: action,
            empty_payers: action,
            dangling_member: action,
        }
    }

    pub fn lenient() -> Self {
        Self::uniform(AnomalyAction::Allow)
    }

    pub fn strict() -> Self {
        Self::uniform(AnomalyAction::Reject)
    }

    pub fn action_for(&self, anomaly: &Anomaly) -> AnomalyAction {
        match anomaly {
            Anomaly::UnknownCurrency { .. } => self.unknown_currency,
            Anomaly::EmptyPayers { .. } => self.empty_payers,
            Anomaly::DanglingMember { .. } => self.dangling_member,
        }
    }
}

/// Lists every anomaly in input order. The display currency is checked first.
pub fn detect_anomalies(
    expenses: &[Expense],
    directory: &MemberDirectory<'_>,
    rates: &RateTable,
    display_currency: &str,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if !rates.contains(display_currency) {
        anomalies.push(Anomaly::UnknownCurrency {
            code: display_currency.to_string(),
            expense_id: None,
        });
    }

    for expense in expenses {
        if !rates.contains(&expense.currency) {
            anomalies.push(Anomaly::UnknownCurrency {
                code: expense.currency.clone(),
                expense_id: Some(expense.id.clone()),
            });
        }

        if expense.payers.is_empty() {
            anomalies.push(Anomaly::EmptyPayers {
                expense_id: expense.id.clone(),
            });
        }

        if !directory.contains(&expense.payee_id) {
            anomalies.push(Anomaly::DanglingMember {
                expense_id: expense.id.clone(),
                member_id: expense.payee_id.clone(),
                role: MemberRole::Payee,
            });
        }

        for payer in expense.payers.iter().filter(|id| !directory.contains(id)) {
            anomalies.push(Anomaly::DanglingMember {
                expense_id: expense.id.clone(),
                member_id: payer.clone(),
                role: MemberRole::Payer,
            });
        }
    }

    anomalies
}

/// Applies a [`SettlementPolicy`] to anomalies as they are found.
#[derive(Debug)]
pub struct AnomalyLog {
    policy: SettlementPolicy,
    recorded: Vec<Anomaly>,
}

impl AnomalyLog {
    pub fn new(policy: SettlementPolicy) -> Self {
        Self {
            policy,
            recorded: Vec::new(),
        }
    }

    pub fn report(&mut self, anomaly: Anomaly) -> Result<()> {
        match self.policy.action_for(&anomaly) {
            AnomalyAction::Allow => {
                tracing::debug!("Degrading silently: {:?}", anomaly);
                Ok(())
            }
            AnomalyAction::Warn => {
                tracing::warn!("⚠️ {}", crate::utils::error::SettleError::from(anomaly.clone()));
                self.recorded.push(anomaly);
                Ok(())
            }
            AnomalyAction::Reject => Err(anomaly.into()),
        }
    }

    pub fn into_anomalies(self) -> Vec<Anomaly> {
        self.recorded
    }
}
