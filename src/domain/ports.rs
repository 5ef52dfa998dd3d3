use crate::domain::model::{TransformResult, TripSnapshot};
use crate::domain::services::currency::RateTable;
use crate::domain::services::filter::ExpenseFilter;
use crate::domain::services::policy::SettlementPolicy;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where the trip snapshot is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum InputSource {
    Json { path: String },
    Csv { members: String, expenses: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Json, OutputFormat::Csv];
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!(
                "Unsupported format '{}'. Valid formats: json, csv",
                other
            )),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn input(&self) -> &InputSource;
    fn output_path(&self) -> &str;
    /// `None` falls back to the trip's default currency.
    fn display_currency(&self) -> Option<&str>;
    fn rate_table(&self) -> &RateTable;
    fn policy(&self) -> SettlementPolicy;
    fn filter(&self) -> &ExpenseFilter;
    fn output_formats(&self) -> &[OutputFormat];
    /// Zip archive name when outputs should be bundled.
    fn bundle_name(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<TripSnapshot>;
    async fn transform(&self, snapshot: TripSnapshot) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
