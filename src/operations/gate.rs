use crate::error::{AppError, AppResult};
use crate::models::session::Session;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, Write};

/// Plaintext comparison against the configured `app_password`.
pub struct AccessGate {
    secret: String,
}

impl AccessGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn check(&self, candidate: &str) -> bool {
        candidate == self.secret
    }

    /// Authorizes `session` when `candidate` matches; leaves it untouched otherwise.
    pub fn login(&self, session: &mut Session, candidate: &str) -> AppResult<()> {
        if self.check(candidate) {
            session.authorized = true;
            log::info!("Login successful");
            Ok(())
        } else {
            log::warn!("Login rejected: incorrect password");
            Err(AppError::AuthenticationFailure)
        }
    }

    pub fn logout(&self, session: &mut Session) {
        session.reset(chrono::Local::now().date_naive());
        log::info!("Logged out");
    }
}

/// Authorizes the session, either from a supplied password (one attempt) or
/// by prompting on the terminal until the right password is entered.
pub fn authenticate(gate: &AccessGate, session: &mut Session, supplied: Option<&str>) -> AppResult<()> {
    if let Some(password) = supplied {
        return gate.login(session, password);
    }

    loop {
        let password = read_password("Enter password: ")?;
        match gate.login(session, &password) {
            Ok(()) => {
                println!("Login successful!");
                return Ok(());
            }
            Err(AppError::AuthenticationFailure) => println!("Incorrect password"),
            Err(e) => return Err(e),
        }
    }
}

/// Reads a line from the terminal without echoing it. Esc or Ctrl+C aborts.
pub fn read_password(prompt: &str) -> AppResult<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    enable_raw_mode()?;
    let result = collect_password(event::read);
    disable_raw_mode()?;
    println!();
    result
}

fn collect_password(mut next_event: impl FnMut() -> io::Result<Event>) -> AppResult<String> {
    let mut buffer = String::new();
    loop {
        if let Event::Key(key) = next_event()? {
            if key.kind == KeyEventKind::Release {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Err(AppError::LoginCancelled);
            }
            match key.code {
                KeyCode::Enter => return Ok(buffer),
                KeyCode::Esc => return Err(AppError::LoginCancelled),
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(ch) => buffer.push(ch),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossterm::event::KeyEvent;

    fn session() -> Session {
        Session::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
    }

    fn scripted(keys: Vec<KeyEvent>) -> impl FnMut() -> io::Result<Event> {
        let mut keys = keys.into_iter();
        move || {
            keys.next()
                .map(Event::Key)
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more keys"))
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_exact_secret_grants() {
        let gate = AccessGate::new("open sesame");
        assert!(gate.check("open sesame"));
    }

    #[test]
    fn test_other_strings_deny() {
        let gate = AccessGate::new("open sesame");
        for candidate in ["", "open", "open sesame ", " open sesame", "Open Sesame", "open sesame\n"] {
            assert!(!gate.check(candidate), "{:?} should be denied", candidate);
        }
    }

    #[test]
    fn test_wrong_password_keeps_session_unauthorized() {
        let gate = AccessGate::new("secret");
        let mut session = session();

        let result = gate.login(&mut session, "wrong");
        assert!(matches!(result, Err(AppError::AuthenticationFailure)));
        assert!(!session.authorized);
    }

    #[test]
    fn test_login_then_logout() {
        let gate = AccessGate::new("secret");
        let mut session = session();

        gate.login(&mut session, "secret").unwrap();
        assert!(session.authorized);

        gate.logout(&mut session);
        assert!(!session.authorized);
    }

    #[test]
    fn test_authenticate_with_supplied_password() {
        let gate = AccessGate::new("secret");
        let mut session = session();

        assert!(authenticate(&gate, &mut session, Some("wrong")).is_err());
        assert!(!session.authorized);

        authenticate(&gate, &mut session, Some("secret")).unwrap();
        assert!(session.authorized);
    }

    #[test]
    fn test_password_entry_with_backspace() {
        let keys = vec![
            key(KeyCode::Char('s')),
            key(KeyCode::Char('x')),
            key(KeyCode::Backspace),
            key(KeyCode::Char('e')),
            key(KeyCode::Enter),
        ];
        assert_eq!(collect_password(scripted(keys)).unwrap(), "se");
    }

    #[test]
    fn test_escape_cancels_instead_of_failing_login() {
        let result = collect_password(scripted(vec![key(KeyCode::Char('s')), key(KeyCode::Esc)]));
        assert!(matches!(result, Err(AppError::LoginCancelled)));
    }

    #[test]
    fn test_ctrl_c_cancels_instead_of_failing_login() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let result = collect_password(scripted(vec![ctrl_c]));
        assert!(matches!(result, Err(AppError::LoginCancelled)));
        assert_ne!(
            AppError::LoginCancelled.to_string(),
            AppError::AuthenticationFailure.to_string()
        );
    }
}
