use crate::domain::model::Expense;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const REFERENCE_CURRENCY: &str = "USD";

pub const DEFAULT_RATES: [(&str, f64); 10] = [
    ("USD", 1.0),
    ("EUR", 0.93),
    ("JPY", 157.0),
    ("GBP", 0.79),
    ("AUD", 1.50),
    ("CAD", 1.37),
    ("CHF", 0.90),
    ("CNY", 7.25),
    ("SGD", 1.35),
    ("MYR", 4.71),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        }
    }
}

impl RateTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Unknown codes are treated as already being in reference units.
    /// This is lossy and silent; callers that care check [`contains`](Self::contains) first.
    pub fn rate_or_reference(&self, code: &str) -> f64 {
        self.rate(code).unwrap_or(1.0)
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        convert(amount, from, to, self)
    }

    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.rates.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    /// Overlays `overrides` on top of this table.
    pub fn merged(mut self, overrides: &HashMap<String, f64>) -> Self {
        for (code, rate) in overrides {
            self.rates.insert(code.clone(), *rate);
        }
        self
    }
}

/// 先換成基準幣別 (USD) 再換成目標幣別，不做四捨五入
pub fn convert(amount: f64, from: &str, to: &str, rates: &RateTable) -> f64 {
    let in_reference = amount / rates.rate_or_reference(from);
    in_reference * rates.rate_or_reference(to)
}

/// An expense row paired with its amount in the display currency.
#[derive(Debug, Clone, Copy)]
pub struct ConvertedExpense<'a> {
    pub expense: &'a Expense,
    pub amount: f64,
}

impl ConvertedExpense<'_> {
    /// Each payer's equal part of the converted amount.
    pub fn share(&self) -> f64 {
        self.amount / self.expense.share_count() as f64
    }
}

pub fn convert_expenses<'a>(
    expenses: &'a [Expense],
    display_currency: &str,
    rates: &RateTable,
) -> Vec<ConvertedExpense<'a>> {
    expenses
        .iter()
        .map(|expense| ConvertedExpense {
            expense,
            amount: convert(expense.amount, &expense.currency, display_currency, rates),
        })
        .collect()
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
