pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, InputSource, OutputFormat};
use crate::domain::model::{Category, MemberId};
use crate::domain::services::{AnomalyAction, ExpenseFilter, RateTable, SettlementPolicy};
use crate::utils::error::{Result, SettleError};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use std::collections::HashMap;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "tripsplit")]
#[command(about = "Settle shared trip expenses and build spending reports")]
pub struct CliArgs {
    /// Trip snapshot in JSON format
    #[arg(long, conflicts_with_all = ["members", "expenses"])]
    pub input: Option<String>,

    /// Members CSV (id,displayName); use together with --expenses
    #[arg(long, requires = "expenses")]
    pub members: Option<String>,

    /// Expenses CSV; use together with --members
    #[arg(long, requires = "members")]
    pub expenses: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Display currency; defaults to the trip's default currency
    #[arg(long)]
    pub currency: Option<String>,

    /// Extra or replacement rates, e.g. --rate THB=36.2
    #[arg(long = "rate", value_parser = parse_rate)]
    pub rates: Vec<(String, f64)>,

    /// How to treat unknown currencies, empty payer lists and unknown members
    #[arg(long, default_value = "warn")]
    pub policy: AnomalyAction,

    #[arg(long)]
    pub from: Option<NaiveDate>,

    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub payee: Option<MemberId>,

    #[arg(long)]
    pub payer: Option<MemberId>,

    #[arg(long)]
    pub category: Option<Category>,

    #[arg(long, value_delimiter = ',', default_value = "json,csv")]
    pub formats: Vec<OutputFormat>,

    /// Bundle all outputs into this zip archive
    #[arg(long)]
    pub bundle: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
fn parse_rate(value: &str) -> std::result::Result<(String, f64), String> {
    let (code, rate) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=RATE, got '{}'", value))?;
    let rate: f64 = rate
        .trim()
        .parse()
        .map_err(|e| format!("invalid rate '{}': {}", rate, e))?;
    Ok((code.trim().to_string(), rate))
}

#[cfg(feature = "cli")]
impl CliArgs {
    pub fn into_config(self) -> Result<CliConfig> {
        let input = match (self.input, self.members, self.expenses) {
            (Some(path), _, _) => InputSource::Json { path },
            (None, Some(members), Some(expenses)) => InputSource::Csv { members, expenses },
            _ => {
                return Err(SettleError::MissingConfigError {
                    field: "--input or --members/--expenses".to_string(),
                })
            }
        };

        let overrides: HashMap<String, f64> = self.rates.into_iter().collect();

        Ok(CliConfig {
            input,
            output_path: self.output_path,
            display_currency: self.currency,
            rates: RateTable::default().merged(&overrides),
            policy: SettlementPolicy::uniform(self.policy),
            filter: ExpenseFilter {
                start_date: self.from,
                end_date: self.to,
                payee_id: self.payee,
                payer_id: self.payer,
                category: self.category,
            },
            formats: self.formats,
            bundle: self.bundle,
        })
    }
}

/// Resolved configuration for a flag-driven run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub input: InputSource,
    pub output_path: String,
    pub display_currency: Option<String>,
    pub rates: RateTable,
    pub policy: SettlementPolicy,
    pub filter: ExpenseFilter,
    pub formats: Vec<OutputFormat>,
    pub bundle: Option<String>,
}

impl CliConfig {
    pub fn new(input: InputSource, output_path: impl Into<String>) -> Self {
        Self {
            input,
            output_path: output_path.into(),
            display_currency: None,
            rates: RateTable::default(),
            policy: SettlementPolicy::default(),
            filter: ExpenseFilter::default(),
            formats: OutputFormat::ALL.to_vec(),
            bundle: None,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn input(&self) -> &InputSource {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn display_currency(&self) -> Option<&str> {
        self.display_currency.as_deref()
    }

    fn rate_table(&self) -> &RateTable {
        &self.rates
    }

    fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    fn filter(&self) -> &ExpenseFilter {
        &self.filter
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    fn bundle_name(&self) -> Option<&str> {
        self.bundle.as_deref()
    }
}

pub(crate) fn validate_input_source(input: &InputSource) -> Result<()> {
    match input {
        InputSource::Json { path } => validation::validate_path("input.path", path),
        InputSource::Csv { members, expenses } => {
            validation::validate_path("input.members", members)?;
            validation::validate_path("input.expenses", expenses)
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_input_source(&self.input)?;
        validation::validate_path("output_path", &self.output_path)?;
        if let Some(currency) = &self.display_currency {
            validation::validate_currency_code("currency", currency)?;
        }
        validation::validate_rate_table("rates", &self.rates)?;
        validation::validate_date_range("--from/--to", &self.filter)?;
        if self.formats.is_empty() {
            return Err(SettleError::InvalidConfigValueError {
                field: "formats".to_string(),
                value: String::new(),
                reason: "At least one output format is required".to_string(),
            });
        }
        if let Some(bundle) = &self.bundle {
            validation::validate_non_empty_string("bundle", bundle)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_validation() {
        let config = CliConfig::new(
            InputSource::Json {
                path: "trip.json".to_string(),
            },
            "./out",
        );
        assert!(config.validate().is_ok());

        let mut lowercase_currency = config.clone();
        lowercase_currency.display_currency = Some("eur".to_string());
        assert!(lowercase_currency.validate().is_err());

        let mut no_formats = config.clone();
        no_formats.formats.clear();
        assert!(no_formats.validate().is_err());
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let mut config = CliConfig::new(
            InputSource::Json {
                path: "trip.json".to_string(),
            },
            "./out",
        );
        config.filter.start_date = NaiveDate::from_ymd_opt(2024, 5, 10);
        config.filter.end_date = NaiveDate::from_ymd_opt(2024, 5, 1);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, SettleError::InvalidConfigValueError { ref field, .. } if field == "--from/--to"));

        // 同一天視為有效範圍
        config.filter.start_date = config.filter.end_date;
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_args_into_config() {
        let args = CliArgs::try_parse_from([
            "tripsplit",
            "--members",
            "members.csv",
            "--expenses",
            "expenses.csv",
            "--currency",
            "EUR",
            "--rate",
            "THB=36",
            "--policy",
            "reject",
            "--category",
            "hotel",
            "--from",
            "2024-05-01",
            "--formats",
            "csv",
        ])
        .unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(
            config.input,
            InputSource::Csv {
                members: "members.csv".to_string(),
                expenses: "expenses.csv".to_string()
            }
        );
        assert_eq!(config.display_currency.as_deref(), Some("EUR"));
        assert_eq!(config.rates.rate("THB"), Some(36.0));
        assert_eq!(config.policy, SettlementPolicy::strict());
        assert_eq!(config.filter.category, Some(Category::Hotel));
        assert_eq!(config.filter.start_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(config.formats, vec![OutputFormat::Csv]);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_args_require_an_input() {
        let args = CliArgs::try_parse_from(["tripsplit"]).unwrap();
        assert!(args.into_config().is_err());

        assert!(CliArgs::try_parse_from(["tripsplit", "--members", "m.csv"]).is_err());
    }
}
