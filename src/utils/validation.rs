use crate::domain::model::TripSnapshot;
use crate::domain::services::currency::RateTable;
use crate::domain::services::filter::ExpenseFilter;
use crate::utils::error::{Result, SettleError};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SettleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SettleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SettleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 幣別代碼須為三個大寫英文字母，例如 USD
pub fn validate_currency_code(field_name: &str, code: &str) -> Result<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(SettleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: code.to_string(),
            reason: "Currency code must be three uppercase letters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_rate_table(field_name: &str, rates: &RateTable) -> Result<()> {
    for (code, rate) in rates.iter() {
        validate_currency_code(field_name, code)?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SettleError::InvalidConfigValueError {
                field: format!("{}.{}", field_name, code),
                value: rate.to_string(),
                reason: "Rate must be a positive number".to_string(),
            });
        }
    }
    Ok(())
}

/// 起始日不可晚於結束日
pub fn validate_date_range(field_name: &str, filter: &ExpenseFilter) -> Result<()> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(SettleError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format!("{}..{}", start, end),
                reason: "Start date is after end date".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SettleError::MissingConfigError {
        field: field_name.to_string(),
    })
}

/// Well-formedness only. Unknown currencies and member references are left
/// to the settlement policy.
impl Validate for TripSnapshot {
    fn validate(&self) -> Result<()> {
        let mut member_ids = HashSet::new();
        for member in &self.members {
            if member.id.trim().is_empty() {
                return Err(SettleError::ValidationError {
                    message: format!("Member '{}' has an empty id", member.display_name),
                });
            }
            if !member_ids.insert(member.id.as_str()) {
                return Err(SettleError::ValidationError {
                    message: format!("Duplicate member id '{}'", member.id),
                });
            }
        }

        for expense in &self.expenses {
            if expense.id.trim().is_empty() {
                return Err(SettleError::ValidationError {
                    message: "Expense with an empty id".to_string(),
                });
            }
            if !expense.amount.is_finite() || expense.amount <= 0.0 {
                return Err(SettleError::ValidationError {
                    message: format!(
                        "Expense '{}' has invalid amount {}",
                        expense.id, expense.amount
                    ),
                });
            }
            if expense.currency.trim().is_empty() {
                return Err(SettleError::ValidationError {
                    message: format!("Expense '{}' has no currency", expense.id),
                });
            }
        }

        Ok(())
    }
}
