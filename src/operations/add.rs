use crate::db::repository::LedgerStore;
use crate::db::sheet::Sheet;
use crate::error::{AppError, AppResult};
use crate::models::transaction::{Transaction, TransactionType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn parse_date(input: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date '{}'. Use YYYY-MM-DD.", input.trim())))
}

pub fn parse_amount(input: &str) -> AppResult<Decimal> {
    let amount = Decimal::from_str(input.trim()).map_err(|_| {
        AppError::validation(format!(
            "Invalid amount format {}. Please provide a valid decimal number.",
            input.trim()
        ))
    })?;
    if amount < Decimal::ZERO {
        return Err(AppError::validation("Amount must not be negative"));
    }
    Ok(amount.round_dp(2))
}

/// Builds a transaction from raw form fields.
pub fn create_transaction(
    date: NaiveDate,
    transaction_type: &str,
    amount: &str,
    description: &str,
    recurring: bool,
) -> AppResult<Transaction> {
    let transaction_type = TransactionType::from_str(transaction_type)?;
    let amount = parse_amount(amount)?;
    let description = description.trim().to_string();
    if recurring && transaction_type != TransactionType::Bill {
        log::warn!("Recurring flag only applies to bills, ignoring it for {}", transaction_type);
    }
    Transaction::new(date, transaction_type, description, amount, recurring)
}

pub fn add_transaction_to_store<S: Sheet + ?Sized>(
    store: &LedgerStore<S>,
    date: NaiveDate,
    transaction_type: &str,
    amount: &str,
    description: &str,
    recurring: bool,
) -> AppResult<Transaction> {
    let transaction = create_transaction(date, transaction_type, amount, description, recurring)?;
    store.append(&transaction)?;
    Ok(transaction)
}
