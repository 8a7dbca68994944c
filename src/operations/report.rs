use crate::models::transaction::Transaction;
use crate::operations::calendar::MonthView;
use rust_decimal::Decimal;
use std::fmt::Write;

const CELL_WIDTH: usize = 14;

pub fn format_money(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp(2);
    if rounded < Decimal::ZERO {
        format!("-{}{:.2}", symbol, rounded.abs())
    } else {
        format!("{}{:.2}", symbol, rounded)
    }
}

pub fn format_entry(tx: &Transaction, symbol: &str) -> String {
    let recurring = if tx.is_recurring() { " (recurring)" } else { "" };
    format!(
        "{:<7} {} {}{}",
        tx.transaction_type.as_str(),
        tx.description,
        format_money(tx.amount, symbol),
        recurring
    )
}

pub fn format_day(date: chrono::NaiveDate, entries: &[Transaction], symbol: &str) -> String {
    let mut out = format!("{}\n", date.format("%A, %Y-%m-%d"));
    if entries.is_empty() {
        out.push_str("  No transactions\n");
        return out;
    }
    for tx in entries {
        let _ = writeln!(out, "  {}", format_entry(tx, symbol));
    }
    let net: Decimal = entries.iter().map(Transaction::signed_amount).sum();
    let _ = writeln!(out, "  Net: {}", format_money(net, symbol));
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Plain-text month grid: one column per weekday plus the weekly total.
pub fn format_month(view: &MonthView, symbol: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title());

    if let Some(first_week) = view.weeks.first() {
        for day in &first_week.days {
            let _ = write!(out, "{:<width$}", day.date.format("%a").to_string(), width = CELL_WIDTH);
        }
        let _ = writeln!(out, "Weekly Total");
    }

    for week in &view.weeks {
        let depth = week.days.iter().map(|d| d.entries.len()).max().unwrap_or(0);

        for day in &week.days {
            let label = if day.in_month {
                day.date.format("%e").to_string()
            } else {
                format!("({})", day.date.format("%-d"))
            };
            let _ = write!(out, "{:<width$}", label.trim_start(), width = CELL_WIDTH);
        }
        let _ = writeln!(out, "{}", format_money(week.total, symbol));

        for line in 0..depth {
            for day in &week.days {
                let cell = match day.entries.get(line) {
                    Some(tx) => {
                        let money = format_money(tx.signed_amount(), symbol);
                        let room = CELL_WIDTH.saturating_sub(money.chars().count() + 2);
                        format!("{} {}", truncate(&tx.description, room), money)
                    }
                    None => String::new(),
                };
                let _ = write!(out, "{:<width$}", cell, width = CELL_WIDTH);
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "Monthly Net: {}", format_money(view.net, symbol));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::TransactionType;
    use crate::operations::calendar::build_month_view;
    use chrono::{NaiveDate, Weekday};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(1250, 2), "$"), "$12.50");
        assert_eq!(format_money(Decimal::new(-1250, 2), "$"), "-$12.50");
        assert_eq!(format_money(Decimal::new(7, 0), "€"), "€7.00");
        assert_eq!(format_money(Decimal::ZERO, "$"), "$0.00");
    }

    #[test]
    fn test_format_day_empty() {
        let text = format_day(ymd(2024, 1, 6), &[], "$");
        assert!(text.contains("2024-01-06"));
        assert!(text.contains("No transactions"));
    }

    #[test]
    fn test_format_day_with_entries() {
        let coffee = Transaction::new(
            ymd(2024, 1, 5),
            TransactionType::Expense,
            "coffee".to_string(),
            Decimal::new(1250, 2),
            false,
        )
        .unwrap();
        let text = format_day(ymd(2024, 1, 5), &[coffee], "$");
        assert!(text.contains("Expense coffee $12.50"));
        assert!(text.contains("Net: -$12.50"));
    }

    #[test]
    fn test_format_month_includes_totals() {
        let transactions = vec![
            Transaction::new(
                ymd(2024, 1, 2),
                TransactionType::Income,
                "salary".to_string(),
                Decimal::new(2000, 0),
                false,
            )
            .unwrap(),
            Transaction::new(
                ymd(2024, 1, 3),
                TransactionType::Bill,
                "a very long bill description".to_string(),
                Decimal::new(50, 0),
                true,
            )
            .unwrap(),
        ];
        let view = build_month_view(&transactions, 2024, 1, Weekday::Sun).unwrap();
        let text = format_month(&view, "$");

        assert!(text.starts_with("January 2024\n"));
        assert!(text.contains("Weekly Total"));
        assert!(text.contains("$1950.00"));
        assert!(text.contains("Monthly Net: $1950.00"));
        assert!(text.contains("(31)"));
        assert!(text.contains('…'));
    }
}
