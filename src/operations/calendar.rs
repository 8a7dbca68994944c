use crate::db::repository::net_total;
use crate::error::{AppError, AppResult};
use crate::models::transaction::Transaction;
use chrono::{Datelike, Days, Month, NaiveDate, Weekday};
use rust_decimal::Decimal;

pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub entries: Vec<Transaction>,
}

pub struct WeekRow {
    pub days: Vec<DayCell>,
    /// Net of all seven days, including those spilling into adjacent months.
    pub total: Decimal,
}

pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<WeekRow>,
    pub net: Decimal,
}

impl MonthView {
    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayCell> {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .find(|d| d.date == date)
    }
}

pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("?")
}

pub fn first_of_month(year: i32, month: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid month {}-{:02}", year, month)))
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// Complete weeks covering the month, starting on `first_weekday`.
pub fn month_weeks(year: i32, month: u32, first_weekday: Weekday) -> AppResult<Vec<[NaiveDate; 7]>> {
    let first = first_of_month(year, month)?;
    let (next_year, next) = next_month(year, month);
    let last = first_of_month(next_year, next)? - Days::new(1);

    let mut weeks = Vec::new();
    let mut week = week_containing(first, first_weekday);
    loop {
        let end = week[6];
        weeks.push(week);
        if end >= last {
            break;
        }
        week = week_containing(end + Days::new(1), first_weekday);
    }
    Ok(weeks)
}

pub fn week_containing(date: NaiveDate, first_weekday: Weekday) -> [NaiveDate; 7] {
    let lead = (7 + date.weekday().num_days_from_monday() - first_weekday.num_days_from_monday()) % 7;
    let start = date - Days::new(lead as u64);
    let mut week = [start; 7];
    for (i, day) in week.iter_mut().enumerate() {
        *day = start + Days::new(i as u64);
    }
    week
}

/// Lays out `transactions` over the month grid with weekly and monthly nets.
pub fn build_month_view(
    transactions: &[Transaction],
    year: i32,
    month: u32,
    first_weekday: Weekday,
) -> AppResult<MonthView> {
    let weeks = month_weeks(year, month, first_weekday)?
        .into_iter()
        .map(|week| {
            let days: Vec<DayCell> = week
                .iter()
                .map(|&date| DayCell {
                    date,
                    in_month: date.year() == year && date.month() == month,
                    entries: transactions.iter().filter(|tx| tx.date == date).cloned().collect(),
                })
                .collect();
            let total = net_total(days.iter().flat_map(|d| d.entries.iter()));
            WeekRow { days, total }
        })
        .collect();

    let net = net_total(
        transactions
            .iter()
            .filter(|tx| tx.date.year() == year && tx.date.month() == month),
    );

    Ok(MonthView {
        year,
        month,
        weeks,
        net,
    })
}
