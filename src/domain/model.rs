use crate::utils::error::SettleError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub type MemberId = String;

/// 分類未填時使用的標籤
pub const DEFAULT_CATEGORY_LABEL: &str = "Misc";

/// 找不到成員時使用的顯示名稱
pub const UNKNOWN_MEMBER_LABEL: &str = "Unknown";

/// 讀取時不分大小寫，與 CLI 及 CSV 的解析一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    Hotel,
    Flight,
    #[serde(rename = "Food and Beverage")]
    FoodAndBeverage,
    Transport,
    Entertainment,
    Misc,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Hotel,
        Category::Flight,
        Category::FoodAndBeverage,
        Category::Transport,
        Category::Entertainment,
        Category::Misc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Hotel => "Hotel",
            Category::Flight => "Flight",
            Category::FoodAndBeverage => "Food and Beverage",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Misc => "Misc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = SettleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SettleError::ValidationError {
                message: format!("Unknown category '{}'", s),
            })
    }
}

impl TryFrom<String> for Category {
    type Error = SettleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    #[serde(alias = "username")]
    pub display_name: String,
}

impl Member {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// One payee-payment row. Rows sharing a `transaction_group_id` were logged
/// together as a single transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_group_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(
        default,
        deserialize_with = "deserialize_expense_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub expense_date: Option<DateTime<Utc>>,
    pub payee_id: MemberId,
    #[serde(default)]
    pub payers: Vec<MemberId>,
    pub amount: f64,
    pub currency: String,
}

impl Expense {
    /// 沒有群組編號的資料列自成一組
    pub fn group_key(&self) -> &str {
        self.transaction_group_id.as_deref().unwrap_or(&self.id)
    }

    pub fn category_label(&self) -> &'static str {
        self.category
            .map(|category| category.label())
            .unwrap_or(DEFAULT_CATEGORY_LABEL)
    }

    /// Calendar day of the expense, taken in UTC.
    pub fn expense_day(&self) -> Option<NaiveDate> {
        self.expense_date.map(|date| date.date_naive())
    }

    /// Number of equal shares the amount is split into; never zero.
    pub fn share_count(&self) -> usize {
        self.payers.len().max(1)
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_expense_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

fn deserialize_expense_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_expense_date(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid expense date '{}'", value))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_currency: Option<String>,
}

/// Everything a report is computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripInfo>,
    pub members: Vec<Member>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl TripSnapshot {
    pub fn default_currency(&self) -> Option<&str> {
        self.trip
            .as_ref()
            .and_then(|trip| trip.default_currency.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBalance {
    pub member_id: MemberId,
    pub display_name: String,
    pub total_paid: f64,
    pub total_owed: f64,
    pub net_balance: f64,
}

impl MemberBalance {
    pub fn zeroed(member: &Member) -> Self {
        Self {
            member_id: member.id.clone(),
            display_name: member.display_name.clone(),
            total_paid: 0.0,
            total_owed: 0.0,
            net_balance: 0.0,
        }
    }
}

/// A `(label, total)` pair ready for a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTotal {
    pub label: String,
    pub total: f64,
}

/// Rows of one logged transaction folded into a single display line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub group_id: String,
    pub description: String,
    pub category: String,
    pub date: Option<DateTime<Utc>>,
    pub payees: Vec<String>,
    pub total: f64,
    pub rows: usize,
}

impl TransactionLine {
    pub fn payee_list(&self) -> String {
        self.payees.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseLine {
    pub expense_id: String,
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    pub payee: String,
    pub category: String,
    pub payers: Vec<String>,
    pub original_amount: f64,
    pub original_currency: String,
    pub converted_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberRole {
    Payee,
    Payer,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRole::Payee => f.write_str("payee"),
            MemberRole::Payer => f.write_str("payer"),
        }
    }
}

/// Input irregularity the engine degraded around instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Anomaly {
    #[serde(rename_all = "camelCase")]
    UnknownCurrency {
        code: String,
        expense_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    EmptyPayers { expense_id: String },
    #[serde(rename_all = "camelCase")]
    DanglingMember {
        expense_id: String,
        member_id: MemberId,
        role: MemberRole,
    },
}

impl From<Anomaly> for SettleError {
    fn from(anomaly: Anomaly) -> Self {
        match anomaly {
            Anomaly::UnknownCurrency { code, expense_id } => {
                SettleError::UnknownCurrency { code, expense_id }
            }
            Anomaly::EmptyPayers { expense_id } => SettleError::EmptyPayers { expense_id },
            Anomaly::DanglingMember {
                expense_id,
                member_id,
                role,
            } => SettleError::DanglingMember {
                expense_id,
                member_id,
                role: role.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub display_currency: String,
    pub balances: Vec<MemberBalance>,
    pub by_category: Vec<LabelTotal>,
    pub by_payee: Vec<LabelTotal>,
    pub by_payer_share: Vec<LabelTotal>,
    pub by_day: Vec<LabelTotal>,
    pub transactions: Vec<TransactionLine>,
    /// 最新的交易在前，未填日期的排最後
    pub recent_transactions: Vec<TransactionLine>,
    pub expense_lines: Vec<ExpenseLine>,
    pub grand_total: f64,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub report: SettlementReport,
    pub outputs: Vec<OutputFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub payee_id: MemberId,
    pub amount: Option<f64>,
    pub currency: String,
}

/// A transaction as entered: one description, several payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub description: String,
    pub category: Option<Category>,
    pub expense_date: Option<DateTime<Utc>>,
    pub payers: Vec<MemberId>,
    pub payments: Vec<PaymentDraft>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!(
            "food and beverage".parse::<Category>().unwrap(),
            Category::FoodAndBeverage
        );
        assert_eq!("Hotel".parse::<Category>().unwrap(), Category::Hotel);
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_deserialization_matches_parsing() {
        let category: Category = serde_json::from_str(r#""food AND beverage""#).unwrap();
        assert_eq!(category, Category::FoodAndBeverage);
        assert!(serde_json::from_str::<Category>(r#""Groceries""#).is_err());

        assert_eq!(
            serde_json::to_string(&Category::FoodAndBeverage).unwrap(),
            r#""Food and Beverage""#
        );
    }

    #[test]
    fn test_expense_json_uses_camel_case() {
        let json = r#"{
            "id": "e1",
            "transactionGroupId": "g1",
            "description": "Hotel",
            "category": "Food and Beverage",
            "expenseDate": "2024-05-01",
            "payeeId": "a",
            "payers": ["a", "b"],
            "amount": 60.0,
            "currency": "USD"
        }"#;

        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.group_key(), "g1");
        assert_eq!(expense.category, Some(Category::FoodAndBeverage));
        assert_eq!(
            expense.expense_day(),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }

    #[test]
    fn test_expense_defaults() {
        let json = r#"{"id": "e2", "payeeId": "a", "amount": 5, "currency": "EUR"}"#;

        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.group_key(), "e2");
        assert_eq!(expense.category_label(), "Misc");
        assert_eq!(expense.share_count(), 1);
        assert!(expense.expense_date.is_none());
    }

    #[test]
    fn test_expense_date_in_utc() {
        let date = parse_expense_date("2024-05-01T23:30:00-02:00").unwrap();
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert!(parse_expense_date("yesterday").is_none());
    }

    #[test]
    fn test_member_accepts_username_alias() {
        let member: Member = serde_json::from_str(r#"{"id": "a", "username": "Alice"}"#).unwrap();
        assert_eq!(member.display_name, "Alice");
    }
}
