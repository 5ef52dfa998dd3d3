use crate::config::validate_input_source;
use crate::core::{ConfigProvider, InputSource, OutputFormat};
use crate::domain::services::{ExpenseFilter, RateTable, SettlementPolicy};
use crate::utils::error::{Result, SettleError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportConfig,
    pub input: InputSource,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub policy: SettlementPolicy,
    #[serde(default)]
    pub filters: ExpenseFilter,
    pub output: OutputConfig,

    /// 由 `currency` 區段組合出的匯率表，第一次使用時才建立
    #[serde(skip)]
    rate_table: OnceLock<RateTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub display: Option<String>,
    /// Rates layered over the built-in table.
    #[serde(default)]
    pub rates: HashMap<String, f64>,
    /// Use only `rates` and drop the built-in table.
    #[serde(default)]
    pub replace_defaults: bool,
}

impl CurrencyConfig {
    pub fn rate_table(&self) -> RateTable {
        if self.replace_defaults {
            RateTable::new(self.rates.clone())
        } else {
            RateTable::default().merged(&self.rates)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<OutputFormat>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SettleError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        let config: TomlConfig =
            toml::from_str(&processed_content).map_err(|e| SettleError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${TRIP_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SettleError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("report.name", &self.report.name)?;
        validate_input_source(&self.input)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(display) = &self.currency.display {
            validation::validate_currency_code("currency.display", display)?;
        }
        validation::validate_rate_table("currency.rates", ConfigProvider::rate_table(self))?;

        if self.output.formats.is_empty() {
            return Err(SettleError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: String::new(),
                reason: "At least one output format is required".to_string(),
            });
        }

        if let Some(compression) = &self.output.compression {
            if compression.enabled {
                validation::validate_non_empty_string(
                    "output.compression.filename",
                    &compression.filename,
                )?;
            }
        }

        validation::validate_date_range("filters", &self.filters)?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input(&self) -> &InputSource {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn display_currency(&self) -> Option<&str> {
        self.currency.display.as_deref()
    }

    fn rate_table(&self) -> &RateTable {
        self.rate_table.get_or_init(|| self.currency.rate_table())
    }

    fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    fn filter(&self) -> &ExpenseFilter {
        &self.filters
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.output.formats
    }

    fn bundle_name(&self) -> Option<&str> {
        self.output
            .compression
            .as_ref()
            .filter(|compression| compression.enabled)
            .map(|compression| compression.filename.as_str())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
