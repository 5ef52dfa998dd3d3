use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettleError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unknown currency code '{code}'{}", expense_suffix(.expense_id))]
    UnknownCurrency {
        code: String,
        expense_id: Option<String>,
    },

    #[error("Expense '{expense_id}' has no payers")]
    EmptyPayers { expense_id: String },

    #[error("Expense '{expense_id}' references unknown {role} '{member_id}'")]
    DanglingMember {
        expense_id: String,
        member_id: String,
        role: String,
    },
}

fn expense_suffix(expense_id: &Option<String>) -> String {
    match expense_id {
        Some(id) => format!(" in expense '{}'", id),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl SettleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SettleError::ConfigError { .. }
            | SettleError::ConfigValidationError { .. }
            | SettleError::InvalidConfigValueError { .. }
            | SettleError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SettleError::CsvError(_) | SettleError::SerializationError(_) => ErrorCategory::Input,
            SettleError::ValidationError { .. }
            | SettleError::UnknownCurrency { .. }
            | SettleError::EmptyPayers { .. }
            | SettleError::DanglingMember { .. } => ErrorCategory::Data,
            SettleError::IoError(_) | SettleError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SettleError::UnknownCurrency { code, .. } => format!(
                "Add a rate for '{}' under [currency.rates], or relax policy.unknown_currency",
                code
            ),
            SettleError::EmptyPayers { .. } => {
                "Give every expense at least one payer, or relax policy.empty_payers".to_string()
            }
            SettleError::DanglingMember { member_id, .. } => format!(
                "Add member '{}' to the member list, or relax policy.dangling_member",
                member_id
            ),
            SettleError::CsvError(_) => {
                "Check the CSV header row and that payers are separated by ';'".to_string()
            }
            SettleError::SerializationError(_) => {
                "Check that the input file is a valid trip snapshot in JSON format".to_string()
            }
            SettleError::IoError(_) => {
                "Check that the input files exist and the output directory is writable"
                    .to_string()
            }
            SettleError::ZipError(_) => "Disable output compression and retry".to_string(),
            SettleError::ConfigError { .. }
            | SettleError::ConfigValidationError { .. }
            | SettleError::InvalidConfigValueError { .. }
            | SettleError::MissingConfigError { .. } => {
                "Review the configuration file or command line flags".to_string()
            }
            SettleError::ValidationError { .. } => {
                "Fix the offending expense records and run the report again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("設定錯誤: {}", self),
            ErrorCategory::Input => format!("無法讀取輸入資料: {}", self),
            ErrorCategory::Data => format!("資料有誤: {}", self),
            ErrorCategory::System => format!("系統錯誤: {}", self),
        }
    }

    /// 對應 CLI 的結束代碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SettleError>;
