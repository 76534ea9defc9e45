//! Append-only CSV recording of trial events.
//!
//! The file is opened and closed around every write so a crash mid-session
//! loses at most the row being written. Columns are fixed-then-user:
//! `psych_version, start_date, start_time, offset, trial, time`, the
//! session's info fields, `code`, then the experiment's declared user
//! columns. Undeclared keys are an error; declared keys without a value
//! record as empty strings.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

/// Column names owned by the recorder itself.
pub const RESERVED_COLUMNS: &[&str] = &[
    "psych_version",
    "start_date",
    "start_time",
    "offset",
    "trial",
    "time",
    "code",
];

/// Recorder errors.
#[derive(Debug, Error)]
pub enum RecordError {
    /// An info field or user column collides with a fixed column name.
    #[error("column name '{0}' is reserved")]
    ReservedColumn(String),

    /// `record` was handed a key that was never declared.
    #[error("column '{0}' was not declared for this experiment")]
    UnknownColumn(String),

    /// File system failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// The append-only event log of one session.
#[derive(Debug)]
pub struct Recorder {
    path: PathBuf,
    info: Vec<(String, String)>,
    user_columns: Vec<String>,
    start_date: String,
    start_time: String,
    header_written: bool,
}

impl Recorder {
    /// Create a recorder writing to `path`, with session-constant info
    /// fields and the user columns this experiment will record.
    ///
    /// Fails with [`RecordError::ReservedColumn`] when an info key or user
    /// column collides with a fixed column (or with each other).
    pub fn new(
        path: impl AsRef<Path>,
        info: Vec<(String, String)>,
        user_columns: Vec<String>,
    ) -> Result<Self, RecordError> {
        for key in info.iter().map(|(k, _)| k).chain(user_columns.iter()) {
            if RESERVED_COLUMNS.contains(&key.as_str()) {
                return Err(RecordError::ReservedColumn(key.clone()));
            }
        }
        for column in &user_columns {
            if info.iter().any(|(k, _)| k == column) {
                return Err(RecordError::ReservedColumn(column.clone()));
            }
        }

        let now = Local::now();
        Ok(Recorder {
            path: path.as_ref().to_path_buf(),
            info,
            user_columns,
            start_date: now.format("%Y-%m-%d").to_string(),
            start_time: now.format("%H:%M:%S").to_string(),
            header_written: false,
        })
    }

    /// The output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header row. Called automatically before the first record;
    /// exposed so an experiment can stamp the file at startup.
    pub fn write_header(&mut self) -> Result<(), RecordError> {
        if self.header_written {
            return Ok(());
        }
        let mut columns: Vec<&str> = vec![
            "psych_version",
            "start_date",
            "start_time",
            "offset",
            "trial",
            "time",
        ];
        columns.extend(self.info.iter().map(|(k, _)| k.as_str()));
        columns.push("code");
        columns.extend(self.user_columns.iter().map(String::as_str));

        self.append_line(&columns.iter().map(|c| escape(c)).collect::<Vec<_>>())?;
        self.header_written = true;
        Ok(())
    }

    /// Record one event row.
    ///
    /// `values` are user-column values by name; every key must have been
    /// declared at construction ([`RecordError::UnknownColumn`] otherwise),
    /// and omitted columns record as empty strings.
    pub fn record(
        &mut self,
        code: &str,
        time: f64,
        offset: u32,
        trial: u32,
        values: &[(&str, &str)],
    ) -> Result<(), RecordError> {
        for (key, _) in values {
            if !self.user_columns.iter().any(|c| c == key) {
                return Err(RecordError::UnknownColumn((*key).to_string()));
            }
        }
        self.write_header()?;

        let mut fields: Vec<String> = vec![
            env!("CARGO_PKG_VERSION").to_string(),
            self.start_date.clone(),
            self.start_time.clone(),
            offset.to_string(),
            trial.to_string(),
            format!("{time:.6}"),
        ];
        fields.extend(self.info.iter().map(|(_, v)| escape(v)));
        fields.push(escape(code));
        for column in &self.user_columns {
            let value = values
                .iter()
                .find(|(k, _)| k == column)
                .map_or("", |(_, v)| *v);
            fields.push(escape(value));
        }
        self.append_line(&fields)
    }

    /// Open, append one LF-terminated line, close.
    fn append_line(&self, fields: &[String]) -> Result<(), RecordError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", fields.join(","))?;
        Ok(())
    }
}
