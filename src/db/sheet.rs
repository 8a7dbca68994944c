use crate::error::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A named table of string rows. Row order is insertion order.
pub trait Sheet {
    fn name(&self) -> &str;

    fn get_all_values(&self) -> AppResult<Vec<Vec<String>>>;

    fn append_row(&self, row: &[String]) -> AppResult<()>;

    fn clear(&self) -> AppResult<()>;
}

fn encode_row(row: &[String]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(row)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::store(format!("Failed to encode row: {}", e)))?;
    let line = String::from_utf8(bytes)
        .map_err(|e| AppError::store(format!("Failed to encode row: {}", e)))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn decode_row(cells: &str) -> AppResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(cells.as_bytes());
    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(|c| c.to_string()).collect()),
        None => Ok(Vec::new()),
    }
}

pub struct SqliteSheet {
    conn: Connection,
    name: String,
}

impl SqliteSheet {
    pub fn open(conn: Connection, name: &str) -> AppResult<Self> {
        let existing: Option<String> = conn
            .query_row("SELECT name FROM sheets WHERE name = ?1", [name], |row| row.get(0))
            .optional()?;
        if existing.is_none() {
            conn.execute(
                "INSERT INTO sheets (name, created_at) VALUES (?1, ?2)",
                params![name, Utc::now().to_rfc3339()],
            )?;
            log::info!("Created sheet '{}'", name);
        }
        Ok(Self {
            conn,
            name: name.to_string(),
        })
    }
}

impl Sheet for SqliteSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_all_values(&self) -> AppResult<Vec<Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT cells FROM sheet_rows WHERE sheet_name = ?1 ORDER BY id ASC")?;
        let cells_iter = stmt.query_map([&self.name], |row| row.get::<_, String>(0))?;

        let mut rows = Vec::new();
        for cells in cells_iter {
            rows.push(decode_row(&cells?)?);
        }
        Ok(rows)
    }

    fn append_row(&self, row: &[String]) -> AppResult<()> {
        self.conn.execute(
            "INSERT INTO sheet_rows (sheet_name, cells) VALUES (?1, ?2)",
            params![&self.name, encode_row(row)?],
        )?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        self.conn
            .execute("DELETE FROM sheet_rows WHERE sheet_name = ?1", [&self.name])?;
        Ok(())
    }
}

/// Hand-edited files may lack a final newline; appending must not merge into that line.
fn terminate_last_line(file: &mut File) -> std::io::Result<()> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Sheet kept as `<dir>/<name>.csv`.
pub struct CsvSheet {
    path: PathBuf,
    name: String,
}

impl CsvSheet {
    pub fn open(dir: &Path, name: &str) -> AppResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::store(format!("Failed to create directory '{}': {}", dir.display(), e))
        })?;
        let path = dir.join(format!("{}.csv", name));
        if !path.exists() {
            File::create(&path).map_err(|e| {
                AppError::store(format!("Failed to create sheet '{}': {}", path.display(), e))
            })?;
            log::info!("Created sheet '{}' at {}", name, path.display());
        }
        Ok(Self {
            path,
            name: name.to_string(),
        })
    }
}

impl Sheet for CsvSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_all_values(&self) -> AppResult<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for (line_index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::store(format!("CSV parse error on line {}: {}", line_index + 1, e))
            })?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(rows)
    }

    fn append_row(&self, row: &[String]) -> AppResult<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::store(format!("Failed to open file '{}': {}", self.path.display(), e))
            })?;
        terminate_last_line(&mut file)
            .map_err(|e| AppError::store(format!("Failed to write row: {}", e)))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(row)?;
        writer
            .flush()
            .map_err(|e| AppError::store(format!("Failed to write row: {}", e)))?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        File::create(&self.path).map_err(|e| {
            AppError::store(format!("Failed to clear '{}': {}", self.path.display(), e))
        })?;
        Ok(())
    }
}
