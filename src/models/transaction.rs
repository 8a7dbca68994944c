use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MAX_DESCRIPTION_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Expense,
    Bill,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
            TransactionType::Bill => "Bill",
        }
    }

    pub fn next(self) -> Self {
        match self {
            TransactionType::Income => TransactionType::Expense,
            TransactionType::Expense => TransactionType::Bill,
            TransactionType::Bill => TransactionType::Income,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "bill" => Ok(TransactionType::Bill),
            other => Err(AppError::validation(format!(
                "Invalid transaction type '{}'. Use 'income', 'expense' or 'bill'.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: Decimal,
    pub recurring_id: Option<String>,
    pub recurring_active: bool,
}

impl Transaction {
    /// Validated constructor. Only a recurring `Bill` receives a recurring id.
    pub fn new(
        date: NaiveDate,
        transaction_type: TransactionType,
        description: String,
        amount: Decimal,
        recurring: bool,
    ) -> AppResult<Self> {
        if amount < Decimal::ZERO {
            return Err(AppError::validation("Amount must not be negative"));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::validation("Description too long"));
        }

        let recurring_id = if recurring && transaction_type == TransactionType::Bill {
            Some(format!("{}-{}", description, Uuid::new_v4()))
        } else {
            None
        };

        Ok(Self {
            date,
            transaction_type,
            description,
            amount,
            recurring_id,
            recurring_active: true,
        })
    }

    /// Amount with the ledger sign applied: income adds, expenses and bills subtract.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense | TransactionType::Bill => -self.amount,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn test_new_expense() {
        let tx = Transaction::new(
            date(),
            TransactionType::Expense,
            "coffee".to_string(),
            Decimal::new(1250, 2),
            false,
        )
        .unwrap();
        assert_eq!(tx.signed_amount(), Decimal::new(-1250, 2));
        assert!(tx.recurring_active);
        assert!(!tx.is_recurring());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = Transaction::new(
            date(),
            TransactionType::Income,
            "refund".to_string(),
            Decimal::new(-1, 0),
            false,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_description_too_long() {
        let result = Transaction::new(
            date(),
            TransactionType::Expense,
            "x".repeat(MAX_DESCRIPTION_LEN + 1),
            Decimal::ONE,
            false,
        );
        assert_eq!(result.unwrap_err().to_string(), "Description too long");
    }

    #[test]
    fn test_recurring_bill_gets_id() {
        let tx = Transaction::new(
            date(),
            TransactionType::Bill,
            "Rent".to_string(),
            Decimal::new(900, 0),
            true,
        )
        .unwrap();
        let id = tx.recurring_id.as_deref().unwrap();
        assert!(id.starts_with("Rent-"));
        assert_eq!(id.len(), "Rent-".len() + 36);
        assert_eq!(tx.signed_amount(), Decimal::new(-900, 0));
    }

    #[test]
    fn test_recurring_ignored_for_non_bills() {
        let tx = Transaction::new(
            date(),
            TransactionType::Income,
            "Salary".to_string(),
            Decimal::new(2000, 0),
            true,
        )
        .unwrap();
        assert!(tx.recurring_id.is_none());
    }

    #[test]
    fn test_type_parse_case_insensitive() {
        assert_eq!("INCOME".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!(" bill ".parse::<TransactionType>().unwrap(), TransactionType::Bill);
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_type_cycle() {
        let mut t = TransactionType::Income;
        for expected in [TransactionType::Expense, TransactionType::Bill, TransactionType::Income] {
            t = t.next();
            assert_eq!(t, expected);
        }
    }
}
