use crate::config::{StoreBackend, StoreConfig};
use crate::db::sheet::{CsvSheet, Sheet, SqliteSheet};
use crate::error::AppResult;
use rusqlite::Connection;
use std::path::Path;

fn create_schema(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sheets (
            name TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sheet_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sheet_name TEXT NOT NULL REFERENCES sheets(name),
            cells TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub fn establish_connection(path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn establish_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens the configured sheet, creating it when it does not exist yet.
pub fn open_sheet(store: &StoreConfig) -> AppResult<Box<dyn Sheet>> {
    log::debug!(
        "Opening sheet '{}' ({:?} backend at {})",
        store.sheet_name,
        store.backend,
        store.path.display()
    );
    match store.backend {
        StoreBackend::Sqlite => {
            let conn = establish_connection(&store.path)?;
            Ok(Box::new(SqliteSheet::open(conn, &store.sheet_name)?))
        }
        StoreBackend::Csv => Ok(Box::new(CsvSheet::open(&store.path, &store.sheet_name)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = establish_test_connection().unwrap();
        assert!(create_schema(&conn).is_ok());
    }

    #[test]
    fn test_open_sqlite_sheet_from_config() {
        let dir = tempdir().unwrap();
        let store = StoreConfig {
            backend: StoreBackend::Sqlite,
            path: dir.path().join("ledger.db"),
            sheet_name: "Financial_Calendar_Data".to_string(),
        };

        let sheet = open_sheet(&store).unwrap();
        sheet.append_row(&["a".to_string(), "b".to_string()]).unwrap();
        drop(sheet);

        let reopened = open_sheet(&store).unwrap();
        assert_eq!(reopened.name(), "Financial_Calendar_Data");
        assert_eq!(reopened.get_all_values().unwrap(), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_open_csv_sheet_from_config() {
        let dir = tempdir().unwrap();
        let store = StoreConfig {
            backend: StoreBackend::Csv,
            path: PathBuf::from(dir.path()),
            sheet_name: "Budget".to_string(),
        };

        let sheet = open_sheet(&store).unwrap();
        assert!(sheet.get_all_values().unwrap().is_empty());
        assert!(dir.path().join("Budget.csv").exists());
    }
}
