use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Submitted password did not match `app_password`.
    #[error("authentication failed: incorrect password")]
    AuthenticationFailure,

    /// The password prompt was abandoned with Esc or Ctrl+C.
    #[error("login cancelled")]
    LoginCancelled,

    /// The sheet backend could not be read or written.
    #[error("store access failed: {0}")]
    StoreAccessFailure(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

impl AppError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreAccessFailure(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StoreAccessFailure(e.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        Self::StoreAccessFailure(e.to_string())
    }
}
