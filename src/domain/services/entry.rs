use crate::domain::model::{Expense, TransactionDraft};
use crate::utils::error::{Result, SettleError};

impl TransactionDraft {
    /// Splits the draft into one expense row per usable payment, all sharing
    /// `group_id`. Row ids come from `next_id`.
    ///
    /// Payments without a payee or a positive amount are dropped; at least one
    /// must remain.
    pub fn into_expenses(
        self,
        group_id: &str,
        mut next_id: impl FnMut() -> String,
    ) -> Result<Vec<Expense>> {
        let description = self.description.trim().to_string();
        if description.is_empty() || self.category.is_none() || self.payers.is_empty() {
            return Err(SettleError::ValidationError {
                message: "Description, Category, and at least one Payer are required."
                    .to_string(),
            });
        }

        let expenses: Vec<Expense> = self
            .payments
            .into_iter()
            .filter(|payment| !payment.payee_id.trim().is_empty())
            .filter_map(|payment| {
                let amount = payment.amount.filter(|amount| amount.is_finite() && *amount > 0.0)?;
                Some(Expense {
                    id: next_id(),
                    transaction_group_id: Some(group_id.to_string()),
                    description: description.clone(),
                    category: self.category,
                    expense_date: self.expense_date,
                    payee_id: payment.payee_id,
                    payers: self.payers.clone(),
                    amount,
                    currency: payment.currency,
                })
            })
            .collect();

        if expenses.is_empty() {
            return Err(SettleError::ValidationError {
                message: "At least one valid payment (Payee and Amount) is required.".to_string(),
            });
        }

        tracing::debug!(
            "Split transaction '{}' into {} expense rows",
            description,
            expenses.len()
        );
        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::model::{Category, PaymentDraft, TransactionDraft};

    fn draft() -> TransactionDraft {
        TransactionDraft {
            description: "  Hotel in Kyoto ".to_string(),
            category: Some(Category::Hotel),
            expense_date: None,
            payers: vec!["a".to_string(), "b".to_string()],
            payments: vec![
                PaymentDraft {
                    payee_id: "a".to_string(),
                    amount: Some(60.0),
                    currency: "JPY".to_string(),
                },
                PaymentDraft {
                    payee_id: "b".to_string(),
                    amount: Some(40.0),
                    currency: "USD".to_string(),
                },
                PaymentDraft {
                    payee_id: "c".to_string(),
                    amount: None,
                    currency: "USD".to_string(),
                },
            ],
        }
    }

    fn counter() -> impl FnMut() -> String {
        let mut next = 0;
        move || {
            next += 1;
            format!("row-{}", next)
        }
    }

    #[test]
    fn test_draft_becomes_grouped_rows() {
        let expenses = draft().into_expenses("g1", counter()).unwrap();

        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|e| e.group_key() == "g1"));
        assert!(expenses.iter().all(|e| e.description == "Hotel in Kyoto"));
        assert_eq!(expenses[0].id, "row-1");
        assert_eq!(expenses[1].id, "row-2");
        assert_eq!(expenses[0].currency, "JPY");
        assert_eq!(expenses[1].payers, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_required_fields_rejected() {
        let mut missing_category = draft();
        missing_category.category = None;
        assert!(missing_category.into_expenses("g1", counter()).is_err());

        let mut missing_payers = draft();
        missing_payers.payers.clear();
        assert!(missing_payers.into_expenses("g1", counter()).is_err());

        let mut blank_description = draft();
        blank_description.description = "   ".to_string();
        assert!(blank_description.into_expenses("g1", counter()).is_err());
    }

    #[test]
    fn test_no_usable_payment_rejected() {
        let mut no_payments = draft();
        for payment in &mut no_payments.payments {
            payment.amount = Some(0.0);
        }
        let err = no_payments.into_expenses("g1", counter()).unwrap_err();
        assert!(err.to_string().contains("valid payment"));
    }
}
