use crate::config::CalendarConfig;
use crate::db::repository::LedgerStore;
use crate::db::sheet::Sheet;
use crate::error::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::transaction::{Transaction, TransactionType};
use crate::operations::add::add_transaction_to_store;
use crate::operations::calendar::{self, MonthView};
use crate::operations::report::format_money;
use chrono::{Datelike, Days, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseExit {
    Quit,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Calendar,
    AddForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Type,
    Description,
    Amount,
    Recurring,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Type => FormField::Description,
            FormField::Description => FormField::Amount,
            FormField::Amount => FormField::Recurring,
            FormField::Recurring => FormField::Type,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::Type => FormField::Recurring,
            FormField::Description => FormField::Type,
            FormField::Amount => FormField::Description,
            FormField::Recurring => FormField::Amount,
        }
    }
}

struct AddForm {
    field: FormField,
    transaction_type: TransactionType,
    description: String,
    amount: String,
    recurring: bool,
    error: Option<String>,
}

impl AddForm {
    fn new() -> Self {
        Self {
            field: FormField::Type,
            transaction_type: TransactionType::Income,
            description: String::new(),
            amount: String::new(),
            recurring: false,
            error: None,
        }
    }
}

struct BrowseState {
    mode: Mode,
    first_weekday: chrono::Weekday,
    currency: String,

    transactions: Vec<Transaction>,
    view: MonthView,
    cursor: NaiveDate,

    form: AddForm,
    status: Option<String>,
}

impl BrowseState {
    fn new(
        transactions: Vec<Transaction>,
        session: &Session,
        settings: &CalendarConfig,
        today: NaiveDate,
    ) -> AppResult<Self> {
        let cursor = if today.year() == session.current_year && today.month() == session.current_month {
            today
        } else {
            calendar::first_of_month(session.current_year, session.current_month)?
        };
        let first_weekday = settings.first_weekday.weekday();
        let view = calendar::build_month_view(
            &transactions,
            session.current_year,
            session.current_month,
            first_weekday,
        )?;

        Ok(Self {
            mode: Mode::Calendar,
            first_weekday,
            currency: settings.currency_symbol.clone(),
            transactions,
            view,
            cursor,
            form: AddForm::new(),
            status: None,
        })
    }

    fn rebuild_view(&mut self, session: &Session) -> AppResult<()> {
        self.view = calendar::build_month_view(
            &self.transactions,
            session.current_year,
            session.current_month,
            self.first_weekday,
        )?;
        Ok(())
    }

    fn refresh<S: Sheet + ?Sized>(&mut self, store: &LedgerStore<S>, session: &Session) -> AppResult<()> {
        self.transactions = store.load_all()?;
        self.rebuild_view(session)
    }

    /// Moves the cursor, following it into the adjacent month when needed.
    fn move_cursor(&mut self, session: &mut Session, delta_days: i64) -> AppResult<()> {
        let moved = if delta_days >= 0 {
            self.cursor.checked_add_days(Days::new(delta_days as u64))
        } else {
            self.cursor.checked_sub_days(Days::new(delta_days.unsigned_abs()))
        };
        let Some(moved) = moved else {
            return Ok(());
        };
        self.cursor = moved;
        if moved.year() != session.current_year || moved.month() != session.current_month {
            session.current_year = moved.year();
            session.current_month = moved.month();
            self.rebuild_view(session)?;
        }
        Ok(())
    }

    fn shift_month(&mut self, session: &mut Session, forward: bool) -> AppResult<()> {
        let (year, month) = if forward {
            calendar::next_month(session.current_year, session.current_month)
        } else {
            calendar::previous_month(session.current_year, session.current_month)
        };
        session.current_year = year;
        session.current_month = month;
        self.cursor = calendar::first_of_month(year, month)?;
        self.rebuild_view(session)
    }

    fn open_form(&mut self, session: &mut Session) {
        session.selected_day = Some(self.cursor);
        self.form = AddForm::new();
        self.status = None;
        self.mode = Mode::AddForm;
    }

    fn close_form(&mut self, session: &mut Session) {
        session.selected_day = None;
        self.mode = Mode::Calendar;
    }

    fn submit_form<S: Sheet + ?Sized>(&mut self, store: &LedgerStore<S>, session: &mut Session) -> AppResult<()> {
        let Some(date) = session.selected_day else {
            self.close_form(session);
            return Ok(());
        };

        let result = add_transaction_to_store(
            store,
            date,
            self.form.transaction_type.as_str(),
            &self.form.amount,
            &self.form.description,
            self.form.recurring,
        );
        match result {
            Ok(_) => {
                self.status = Some("Transaction added!".to_string());
                self.close_form(session);
                self.refresh(store, session)
            }
            Err(AppError::Validation(msg)) => {
                self.form.error = Some(msg);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

pub fn run_browse<S: Sheet + ?Sized>(
    store: &LedgerStore<S>,
    session: &mut Session,
    settings: &CalendarConfig,
) -> AppResult<BrowseExit> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let result = (|| -> AppResult<BrowseExit> {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;

        let today = chrono::Local::now().date_naive();
        let mut state = BrowseState::new(store.load_all()?, session, settings, today)?;

        loop {
            terminal.draw(|frame| {
                let size = frame.area();
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(10),
                        Constraint::Length(3),
                    ])
                    .split(size);

                render_header(frame, layout[0], &state);
                render_grid(frame, layout[1], &state, today);
                render_footer(frame, layout[2], &state);

                if state.mode == Mode::AddForm {
                    render_form_modal(frame, size, &state, session);
                }
            })?;

            if event::poll(std::time::Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if let Some(exit) = handle_key(store, session, &mut state, key)? {
                        return Ok(exit);
                    }
                }
            }
        }
    })();

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)?;

    result
}

fn handle_key<S: Sheet + ?Sized>(
    store: &LedgerStore<S>,
    session: &mut Session,
    state: &mut BrowseState,
    key: KeyEvent,
) -> AppResult<Option<BrowseExit>> {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return Ok(None);
    }

    match state.mode {
        Mode::Calendar => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(BrowseExit::Quit)),
            KeyCode::Char('L') => return Ok(Some(BrowseExit::Logout)),
            KeyCode::Left => state.move_cursor(session, -1)?,
            KeyCode::Right => state.move_cursor(session, 1)?,
            KeyCode::Up => state.move_cursor(session, -7)?,
            KeyCode::Down => state.move_cursor(session, 7)?,
            KeyCode::Char('[') | KeyCode::PageUp => state.shift_month(session, false)?,
            KeyCode::Char(']') | KeyCode::PageDown => state.shift_month(session, true)?,
            KeyCode::Char('a') | KeyCode::Enter => state.open_form(session),
            KeyCode::Char('r') => {
                state.refresh(store, session)?;
                state.status = Some("Reloaded".to_string());
            }
            _ => {}
        },
        Mode::AddForm => {
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                state.close_form(session);
                return Ok(None);
            }

            let form = &mut state.form;
            match key.code {
                KeyCode::Esc => state.close_form(session),
                KeyCode::Enter => state.submit_form(store, session)?,
                KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
                KeyCode::BackTab | KeyCode::Up => form.field = form.field.previous(),
                code => match (form.field, code) {
                    (FormField::Type, KeyCode::Left) => {
                        form.transaction_type = form.transaction_type.next().next();
                    }
                    (FormField::Type, KeyCode::Right | KeyCode::Char(' ')) => {
                        form.transaction_type = form.transaction_type.next();
                    }
                    (FormField::Recurring, KeyCode::Char(' ')) => form.recurring = !form.recurring,
                    (FormField::Description, KeyCode::Char(ch)) => form.description.push(ch),
                    (FormField::Description, KeyCode::Backspace) => {
                        form.description.pop();
                    }
                    (FormField::Amount, KeyCode::Char(ch)) if ch.is_ascii_digit() || ch == '.' => {
                        form.amount.push(ch)
                    }
                    (FormField::Amount, KeyCode::Backspace) => {
                        form.amount.pop();
                    }
                    _ => {}
                },
            }
        }
    }

    Ok(None)
}

fn entry_color(tx: &Transaction) -> Color {
    match tx.transaction_type {
        TransactionType::Income => Color::Blue,
        TransactionType::Bill => Color::Green,
        TransactionType::Expense => Color::Red,
    }
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let net_color = if state.view.net.is_sign_negative() { Color::Red } else { Color::Blue };
    let line = Line::from(vec![
        Span::styled("Financial Calendar", Style::default().fg(Color::Cyan).bold()),
        Span::raw("  |  "),
        Span::styled(state.view.title(), Style::default().bold()),
        Span::raw("  |  Monthly Net: "),
        Span::styled(
            format_money(state.view.net, &state.currency),
            Style::default().fg(net_color).bold(),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Left), area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let hint = match state.mode {
        Mode::Calendar => "←/→/↑/↓ move  [/] month  a/Enter add  r reload  L logout  q/Esc exit",
        Mode::AddForm => "Tab/↑/↓ field  ←/→/Space change  Enter save  Esc cancel",
    };

    let mut spans = vec![Span::raw(hint)];
    if let Some(ref status) = state.status {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_grid(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState, today: NaiveDate) {
    let mut row_constraints = vec![Constraint::Length(1)];
    row_constraints.extend(state.view.weeks.iter().map(|_| Constraint::Ratio(1, state.view.weeks.len() as u32)));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    let column_constraints = vec![Constraint::Ratio(1, 8); 8];

    if let Some(first_week) = state.view.weeks.first() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(column_constraints.clone())
            .split(rows[0]);
        for (i, day) in first_week.days.iter().enumerate() {
            let name = day.date.format("%a").to_string();
            frame.render_widget(
                Paragraph::new(name).alignment(Alignment::Center).style(Style::default().bold()),
                columns[i],
            );
        }
        frame.render_widget(
            Paragraph::new("Weekly Total").alignment(Alignment::Center).style(Style::default().bold()),
            columns[7],
        );
    }

    for (week_index, week) in state.view.weeks.iter().enumerate() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(column_constraints.clone())
            .split(rows[week_index + 1]);

        for (i, day) in week.days.iter().enumerate() {
            let mut border_style = Style::default().fg(Color::DarkGray);
            if day.in_month {
                border_style = Style::default().fg(Color::White);
            }
            if day.date == today {
                border_style = Style::default().fg(Color::Yellow);
            }
            if day.date == state.cursor {
                border_style = Style::default().fg(Color::Cyan).bold();
            }

            let title_style = if day.in_month {
                Style::default().bold()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let lines: Vec<Line> = day
                .entries
                .iter()
                .map(|tx| {
                    Line::from(Span::styled(
                        format!("{} {}", tx.description, format_money(tx.amount, &state.currency)),
                        Style::default().fg(entry_color(tx)),
                    ))
                })
                .collect();

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(day.date.day().to_string(), title_style));
            frame.render_widget(
                Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
                columns[i],
            );
        }

        let total_color = if week.total.is_sign_negative() { Color::Red } else { Color::Blue };
        let total = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                format_money(week.total, &state.currency),
                Style::default().fg(total_color).bold(),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(total, columns[7]);
    }
}

fn render_form_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState, session: &Session) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let form = &state.form;
    let day = session
        .selected_day
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let field_style = |field: FormField| {
        if form.field == field {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        }
    };
    let checkbox = if form.recurring { "[x]" } else { "[ ]" };

    let mut lines = vec![
        Line::from(vec![Span::styled(
            format!("Adding transaction for {}", day),
            Style::default().fg(Color::Cyan).bold(),
        )]),
        Line::from(""),
        Line::from(Span::styled(
            format!("Type:        < {} >", form.transaction_type),
            field_style(FormField::Type),
        )),
        Line::from(Span::styled(
            format!("Description: {}", form.description),
            field_style(FormField::Description),
        )),
        Line::from(Span::styled(
            format!("Amount:      {}", form.amount),
            field_style(FormField::Amount),
        )),
        Line::from(Span::styled(
            format!("{} Recurring (Bills only)", checkbox),
            field_style(FormField::Recurring),
        )),
    ];

    let existing = session
        .selected_day
        .and_then(|d| state.view.day(d))
        .map(|cell| cell.entries.as_slice())
        .unwrap_or_default();
    if !existing.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Already recorded:", Style::default().fg(Color::DarkGray))));
        for tx in existing {
            lines.push(Line::from(Span::styled(
                format!("  {} {}", tx.description, format_money(tx.amount, &state.currency)),
                Style::default().fg(entry_color(tx)),
            )));
        }
    }

    if let Some(ref err) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(err.clone(), Style::default().fg(Color::Red))]));
    }

    let block = Block::default().borders(Borders::ALL).title("Add Transaction");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::db::sheet::SqliteSheet;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_store() -> LedgerStore<SqliteSheet> {
        let conn = establish_test_connection().unwrap();
        let sheet = SqliteSheet::open(conn, "Financial_Calendar_Data").unwrap();
        LedgerStore::connect(Box::new(sheet)).unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup(store: &LedgerStore<SqliteSheet>) -> (Session, BrowseState) {
        let today = ymd(2024, 1, 15);
        let mut session = Session::new(today);
        session.authorized = true;
        let state =
            BrowseState::new(store.load_all().unwrap(), &session, &CalendarConfig::default(), today)
                .unwrap();
        (session, state)
    }

    fn type_text(store: &LedgerStore<SqliteSheet>, session: &mut Session, state: &mut BrowseState, text: &str) {
        for ch in text.chars() {
            handle_key(store, session, state, press(KeyCode::Char(ch))).unwrap();
        }
    }

    #[test]
    fn test_cursor_starts_on_today() {
        let store = open_store();
        let (_, state) = setup(&store);
        assert_eq!(state.cursor, ymd(2024, 1, 15));
        assert_eq!(state.view.title(), "January 2024");
    }

    #[test]
    fn test_cursor_crossing_month_switches_view() {
        let store = open_store();
        let (mut session, mut state) = setup(&store);

        for _ in 0..3 {
            handle_key(&store, &mut session, &mut state, press(KeyCode::Down)).unwrap();
        }
        assert_eq!(state.cursor, ymd(2024, 2, 5));
        assert_eq!((session.current_year, session.current_month), (2024, 2));
        assert_eq!(state.view.title(), "February 2024");
    }

    #[test]
    fn test_month_keys_wrap_year() {
        let store = open_store();
        let (mut session, mut state) = setup(&store);

        handle_key(&store, &mut session, &mut state, press(KeyCode::Char('['))).unwrap();
        assert_eq!((session.current_year, session.current_month), (2023, 12));
        assert_eq!(state.cursor, ymd(2023, 12, 1));

        handle_key(&store, &mut session, &mut state, press(KeyCode::Char(']'))).unwrap();
        handle_key(&store, &mut session, &mut state, press(KeyCode::Char(']'))).unwrap();
        assert_eq!((session.current_year, session.current_month), (2024, 2));
    }

    #[test]
    fn test_add_form_submits_to_store() {
        let store = open_store();
        let (mut session, mut state) = setup(&store);

        handle_key(&store, &mut session, &mut state, press(KeyCode::Char('a'))).unwrap();
        assert_eq!(state.mode, Mode::AddForm);
        assert_eq!(session.selected_day, Some(ymd(2024, 1, 15)));

        // Income -> Expense
        handle_key(&store, &mut session, &mut state, press(KeyCode::Right)).unwrap();
        handle_key(&store, &mut session, &mut state, press(KeyCode::Tab)).unwrap();
        type_text(&store, &mut session, &mut state, "coffee");
        handle_key(&store, &mut session, &mut state, press(KeyCode::Tab)).unwrap();
        type_text(&store, &mut session, &mut state, "12.5x0");
        handle_key(&store, &mut session, &mut state, press(KeyCode::Enter)).unwrap();

        assert_eq!(state.mode, Mode::Calendar);
        assert_eq!(session.selected_day, None);
        assert_eq!(state.status.as_deref(), Some("Transaction added!"));

        let listed: Vec<Transaction> = store.list(ymd(2024, 1, 15)).unwrap().collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].transaction_type, TransactionType::Expense);
        assert_eq!(listed[0].description, "coffee");
        assert_eq!(listed[0].amount, rust_decimal::Decimal::new(1250, 2));
        assert_eq!(state.view.day(ymd(2024, 1, 15)).unwrap().entries.len(), 1);
    }

    #[test]
    fn test_add_form_validation_error_stays_open() {
        let store = open_store();
        let (mut session, mut state) = setup(&store);

        handle_key(&store, &mut session, &mut state, press(KeyCode::Enter)).unwrap();
        handle_key(&store, &mut session, &mut state, press(KeyCode::Enter)).unwrap();

        assert_eq!(state.mode, Mode::AddForm);
        assert!(state.form.error.is_some());
        assert!(store.load_all().unwrap().is_empty());

        handle_key(&store, &mut session, &mut state, press(KeyCode::Esc)).unwrap();
        assert_eq!(state.mode, Mode::Calendar);
        assert_eq!(session.selected_day, None);
    }

    #[test]
    fn test_quit_and_logout_keys() {
        let store = open_store();
        let (mut session, mut state) = setup(&store);

        let exit = handle_key(&store, &mut session, &mut state, press(KeyCode::Char('L'))).unwrap();
        assert_eq!(exit, Some(BrowseExit::Logout));

        let exit = handle_key(&store, &mut session, &mut state, press(KeyCode::Char('q'))).unwrap();
        assert_eq!(exit, Some(BrowseExit::Quit));
    }

    #[test]
    fn test_form_field_cycle() {
        let mut field = FormField::Type;
        for _ in 0..4 {
            field = field.next();
        }
        assert_eq!(field, FormField::Type);
        assert_eq!(FormField::Type.previous(), FormField::Recurring);
    }
}
