use chrono::{Datelike, NaiveDate};

/// Per-run session context: the authorization flag plus the calendar cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub authorized: bool,
    pub current_year: i32,
    pub current_month: u32,
    pub selected_day: Option<NaiveDate>,
}

impl Session {
    /// A fresh, unauthorized session looking at the month containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            authorized: false,
            current_year: today.year(),
            current_month: today.month(),
            selected_day: None,
        }
    }

    pub fn reset(&mut self, today: NaiveDate) {
        *self = Session::new(today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unauthorized() {
        let session = Session::new(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert!(!session.authorized);
        assert_eq!(session.current_year, 2024);
        assert_eq!(session.current_month, 3);
        assert_eq!(session.selected_day, None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let mut session = Session::new(today);
        session.authorized = true;
        session.current_month = 7;
        session.selected_day = NaiveDate::from_ymd_opt(2024, 7, 1);

        session.reset(today);
        assert_eq!(session, Session::new(today));
    }
}
