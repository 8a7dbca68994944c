use crate::error::{AppError, AppResult};
use chrono::Weekday;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SECRETS_PATH: &str = ".fincal/secrets.toml";
pub const DEFAULT_SHEET_NAME: &str = "Financial_Calendar_Data";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Secrets {
    pub app_password: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// SQLite database file, or the directory holding `<sheet_name>.csv`.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
            sheet_name: default_sheet_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstWeekday {
    Sunday,
    Monday,
}

impl FirstWeekday {
    pub fn weekday(self) -> Weekday {
        match self {
            FirstWeekday::Sunday => Weekday::Sun,
            FirstWeekday::Monday => Weekday::Mon,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarConfig {
    #[serde(default = "default_first_weekday")]
    pub first_weekday: FirstWeekday,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            first_weekday: default_first_weekday(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_store_path() -> PathBuf {
    PathBuf::from("financial_calendar.db")
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_first_weekday() -> FirstWeekday {
    FirstWeekday::Sunday
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Secrets {
    pub fn load_from_file(path: &Path) -> AppResult<Secrets> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read secrets file '{}': {}", path.display(), e))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> AppResult<Secrets> {
        let secrets: Secrets =
            toml::from_str(raw).map_err(|e| AppError::config(format!("Invalid secrets file: {}", e)))?;
        secrets.validate()?;
        Ok(secrets)
    }

    fn validate(&self) -> AppResult<()> {
        if self.app_password.is_empty() {
            return Err(AppError::config("app_password must not be empty"));
        }
        if self.store.sheet_name.trim().is_empty() {
            return Err(AppError::config("store.sheet_name must not be empty"));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(AppError::config("store.path must not be empty"));
        }
        Ok(())
    }
}
