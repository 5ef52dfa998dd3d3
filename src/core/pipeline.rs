use crate::core::render;
use crate::core::{ConfigProvider, InputSource, Pipeline, Storage, TransformResult, TripSnapshot};
use crate::domain::model::{parse_expense_date, Category, Expense, Member};
use crate::domain::services::currency::REFERENCE_CURRENCY;
use crate::domain::services::SettlementEngine;
use crate::utils::error::{Result, SettleError};
use crate::utils::validation::Validate;
use serde::Deserialize;
use std::path::Path;

/// 成員 CSV 的一列：`id,displayName`
#[derive(Debug, Deserialize)]
struct MemberRow {
    id: String,
    #[serde(rename = "displayName", alias = "username")]
    display_name: String,
}

/// 支出 CSV 的一列，付款人以 `;` 分隔
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseRow {
    id: String,
    #[serde(default)]
    transaction_group_id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    expense_date: String,
    payee_id: String,
    #[serde(default)]
    payers: String,
    amount: f64,
    currency: String,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = SettleError;

    fn try_from(row: ExpenseRow) -> Result<Self> {
        let category = match row.category.trim() {
            "" => None,
            label => Some(label.parse::<Category>()?),
        };

        let expense_date = match row.expense_date.trim() {
            "" => None,
            value => Some(parse_expense_date(value).ok_or_else(|| {
                SettleError::ValidationError {
                    message: format!("Expense '{}' has invalid date '{}'", row.id, value),
                }
            })?),
        };

        let transaction_group_id = Some(row.transaction_group_id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let payers = row
            .payers
            .split(';')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Expense {
            id: row.id,
            transaction_group_id,
            description: row.description,
            category,
            expense_date,
            payee_id: row.payee_id.trim().to_string(),
            payers,
            amount: row.amount,
            currency: row.currency.trim().to_string(),
        })
    }
}

pub fn parse_members_csv(data: &[u8]) -> Result<Vec<Member>> {
    let mut reader = csv::Reader::from_reader(data);
    let mut members = Vec::new();
    for row in reader.deserialize::<MemberRow>() {
        let row = row?;
        members.push(Member::new(row.id.trim(), row.display_name.trim()));
    }
    Ok(members)
}

pub fn parse_expenses_csv(data: &[u8]) -> Result<Vec<Expense>> {
    let mut reader = csv::Reader::from_reader(data);
    let mut expenses = Vec::new();
    for row in reader.deserialize::<ExpenseRow>() {
        expenses.push(Expense::try_from(row?)?);
    }
    Ok(expenses)
}

pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Explicit configuration wins, then the trip's own default.
    pub fn resolve_display_currency(&self, snapshot: &TripSnapshot) -> String {
        self.config
            .display_currency()
            .or_else(|| snapshot.default_currency())
            .unwrap_or(REFERENCE_CURRENCY)
            .to_string()
    }

    fn output_location(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<TripSnapshot> {
        let snapshot = match self.config.input() {
            InputSource::Json { path } => {
                tracing::debug!("Reading trip snapshot from {}", path);
                let data = self.storage.read_file(path).await?;
                serde_json::from_slice::<TripSnapshot>(&data)?
            }
            InputSource::Csv { members, expenses } => {
                tracing::debug!("Reading members from {} and expenses from {}", members, expenses);
                let member_data = self.storage.read_file(members).await?;
                let expense_data = self.storage.read_file(expenses).await?;
                TripSnapshot {
                    trip: None,
                    members: parse_members_csv(&member_data)?,
                    expenses: parse_expenses_csv(&expense_data)?,
                }
            }
        };

        snapshot.validate()?;
        tracing::info!(
            "📊 Extracted {} members and {} expenses",
            snapshot.members.len(),
            snapshot.expenses.len()
        );
        Ok(snapshot)
    }

    async fn transform(&self, snapshot: TripSnapshot) -> Result<TransformResult> {
        let display_currency = self.resolve_display_currency(&snapshot);
        let filter = self.config.filter();

        let expenses = if filter.is_empty() {
            snapshot.expenses
        } else {
            let scoped = filter.apply(&snapshot.expenses);
            tracing::info!(
                "🔎 Filter kept {} of {} expenses",
                scoped.len(),
                snapshot.expenses.len()
            );
            scoped
        };

        let engine =
            SettlementEngine::new(self.config.rate_table()).with_policy(self.config.policy());
        let report = engine.compute(&snapshot.members, &expenses, &display_currency)?;

        let outputs = render::render(&report, self.config.output_formats())?;
        tracing::info!(
            "✅ Report in {} rendered to {} files",
            display_currency,
            outputs.len()
        );

        Ok(TransformResult { report, outputs })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        match self.config.bundle_name() {
            Some(bundle_name) => {
                let output_path = self.output_location(bundle_name);
                tracing::debug!("Bundling {} files into {}", result.outputs.len(), output_path);

                let zip_data = render::bundle(&result.outputs)?;
                self.storage.write_file(&output_path, &zip_data).await?;

                tracing::info!("📦 Report bundle saved: {}", output_path);
                Ok(output_path)
            }
            None => {
                for output in &result.outputs {
                    let path = self.output_location(&output.name);
                    self.storage.write_file(&path, &output.contents).await?;
                }

                let output_path = self.config.output_path().to_string();
                tracing::info!("💾 {} report files saved in {}", result.outputs.len(), output_path);
                Ok(output_path)
            }
        }
    }
}
