use crate::db::sheet::Sheet;
use crate::error::{AppError, AppResult};
use crate::models::transaction::{Transaction, TransactionType};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const HEADERS: [&str; 6] = [
    "date",
    "type",
    "description",
    "amount",
    "recurring_id",
    "recurring_active",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Transaction ledger over a sheet. Every read fetches the whole sheet again.
pub struct LedgerStore<S: Sheet + ?Sized> {
    sheet: Box<S>,
}

impl<S: Sheet + ?Sized> LedgerStore<S> {
    /// Wraps `sheet`, making sure its first row is the ledger header.
    ///
    /// An empty sheet gets the header appended. A sheet whose only row is a
    /// stale header is rewritten. Any readable transaction row under a
    /// missing or foreign header is refused.
    pub fn connect(sheet: Box<S>) -> AppResult<Self> {
        let values = sheet.get_all_values()?;
        match values.first() {
            None => {
                log::info!("Sheet '{}' is empty, writing header row", sheet.name());
                sheet.append_row(&header_row())?;
            }
            Some(first) if is_header(first) => {}
            Some(first) if values.len() == 1 && from_row(first).is_none() => {
                log::warn!(
                    "Sheet '{}' has unexpected header {:?}, rewriting it",
                    sheet.name(),
                    first
                );
                sheet.clear()?;
                sheet.append_row(&header_row())?;
            }
            Some(first) if values.len() == 1 => {
                return Err(AppError::store(format!(
                    "Sheet '{}' has no header row above data {:?}",
                    sheet.name(),
                    first
                )));
            }
            Some(first) => {
                return Err(AppError::store(format!(
                    "Sheet '{}' has unexpected header {:?} above {} data rows",
                    sheet.name(),
                    first,
                    values.len() - 1
                )));
            }
        }
        Ok(Self { sheet })
    }

    pub fn append(&self, transaction: &Transaction) -> AppResult<()> {
        self.sheet.append_row(&to_row(transaction))?;
        log::debug!(
            "Recorded {} '{}' of {} on {}",
            transaction.transaction_type,
            transaction.description,
            transaction.amount,
            transaction.date.format(DATE_FORMAT)
        );
        Ok(())
    }

    /// Every readable transaction, in sheet order.
    pub fn load_all(&self) -> AppResult<Vec<Transaction>> {
        let values = self.sheet.get_all_values()?;
        Ok(values.iter().skip(1).filter_map(|row| from_row(row)).collect())
    }

    /// Transactions recorded on `date`. Calling it again re-fetches the sheet.
    pub fn list(&self, date: NaiveDate) -> AppResult<impl Iterator<Item = Transaction>> {
        let values = self.sheet.get_all_values()?;
        Ok(values
            .into_iter()
            .skip(1)
            .filter_map(|row| from_row(&row))
            .filter(move |tx| tx.date == date))
    }

    pub fn monthly_total(&self, year: i32, month: u32) -> AppResult<Decimal> {
        Ok(net_total(
            self.load_all()?
                .iter()
                .filter(|tx| tx.date.year() == year && tx.date.month() == month),
        ))
    }

    pub fn weekly_total(&self, week_dates: &[NaiveDate]) -> AppResult<Decimal> {
        Ok(net_total(
            self.load_all()?
                .iter()
                .filter(|tx| week_dates.contains(&tx.date)),
        ))
    }
}

pub fn net_total<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
    transactions
        .into_iter()
        .map(Transaction::signed_amount)
        .sum()
}

fn header_row() -> Vec<String> {
    HEADERS.iter().map(|h| h.to_string()).collect()
}

fn is_header(row: &[String]) -> bool {
    row.len() == HEADERS.len() && row.iter().zip(HEADERS.iter()).all(|(a, b)| a == b)
}

fn to_row(transaction: &Transaction) -> Vec<String> {
    vec![
        transaction.date.format(DATE_FORMAT).to_string(),
        transaction.transaction_type.as_str().to_string(),
        transaction.description.clone(),
        transaction.amount.to_string(),
        transaction.recurring_id.clone().unwrap_or_default(),
        if transaction.recurring_active { "TRUE" } else { "FALSE" }.to_string(),
    ]
}

/// Lenient row reader: unparsable dates drop the row, unparsable amounts
/// read as zero and unknown types read as expenses.
fn from_row(row: &[String]) -> Option<Transaction> {
    let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");

    let date = match NaiveDate::parse_from_str(cell(0), DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            log::debug!("Skipping row with unreadable date {:?}", cell(0));
            return None;
        }
    };

    let transaction_type = TransactionType::from_str(cell(1)).unwrap_or_else(|_| {
        log::warn!("Unknown transaction type {:?} on {}, treating as expense", cell(1), date);
        TransactionType::Expense
    });

    let amount = Decimal::from_str(cell(3))
        .or_else(|_| Decimal::from_scientific(cell(3)))
        .unwrap_or_else(|_| {
            log::warn!("Unreadable amount {:?} on {}, treating as 0", cell(3), date);
            Decimal::ZERO
        });

    let recurring_id = match cell(4) {
        "" => None,
        id => Some(id.to_string()),
    };

    let recurring_active = !cell(5).eq_ignore_ascii_case("false");

    Some(Transaction {
        date,
        transaction_type,
        description: row.get(2).cloned().unwrap_or_default(),
        amount,
        recurring_id,
        recurring_active,
    })
}
