//! Read access to the app's status database
//!
//! The production store pulls the whole `databases` directory from the
//! device on every query and reads it with SQLite. Nothing is cached.

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use super::record::BugReportRecord;
use crate::common::paths::DATA_DIR_PREFIX;
use crate::common::{DevicePaths, Error, Result};
use crate::device::{CommandRunner, DeviceController};

/// Column positions in the `bugreports` table
const COL_ID: usize = 0;
const COL_TIMESTAMP: usize = 3;
const COL_FILEPATH: usize = 5;
const COL_STATUS: usize = 6;
const COL_MESSAGE: usize = 7;

/// Source of bugreport status records
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Fresh snapshot of every record
    async fn records(&self) -> Result<Vec<BugReportRecord>>;

    /// The single record of the current run
    async fn active_record(&self) -> Result<BugReportRecord> {
        let mut records = self.records().await?;
        if records.len() != 1 {
            return Err(Error::UnexpectedRecordCount(records.len()));
        }
        Ok(records.remove(0))
    }
}

/// Status store backed by the database on the device
#[derive(Debug, Clone)]
pub struct DeviceStatusStore<R> {
    device: DeviceController<R>,
    paths: DevicePaths,
}

impl<R: CommandRunner> DeviceStatusStore<R> {
    pub fn new(device: DeviceController<R>, paths: DevicePaths) -> Self {
        Self { device, paths }
    }
}

#[async_trait]
impl<R: CommandRunner> StatusStore for DeviceStatusStore<R> {
    async fn records(&self) -> Result<Vec<BugReportRecord>> {
        let tmpdir = tempfile::Builder::new()
            .prefix(DATA_DIR_PREFIX)
            .suffix("db")
            .tempdir()?;

        let output = self.device.pull(&self.paths.db_dir, tmpdir.path()).await?;
        if !output.success() {
            return Err(Error::PullFailed {
                what: "bugreport.db".to_string(),
                exit_code: output.exit_code,
                output: output.stdout.join("\n"),
            });
        }

        // adb pull of a directory into an existing one nests it by name
        let dir_name = Path::new(&self.paths.db_dir)
            .file_name()
            .ok_or_else(|| Error::Internal(format!("bad db dir {}", self.paths.db_dir)))?;
        let db_name = Path::new(&self.paths.db_path)
            .file_name()
            .ok_or_else(|| Error::Internal(format!("bad db path {}", self.paths.db_path)))?;

        read_records(&tmpdir.path().join(dir_name).join(db_name))
    }
}

/// Read every row of the `bugreports` table in a local database file
pub fn read_records(db_path: &Path) -> Result<Vec<BugReportRecord>> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare("SELECT * FROM bugreports")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(COL_ID)?,
            row.get::<_, Value>(COL_TIMESTAMP)?,
            row.get::<_, Option<String>>(COL_FILEPATH)?,
            row.get::<_, i64>(COL_STATUS)?,
            row.get::<_, Option<String>>(COL_MESSAGE)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, timestamp, filepath, status, message) = row?;
        records.push(BugReportRecord::new(
            id,
            value_to_string(timestamp),
            filepath.unwrap_or_default(),
            status,
            message.unwrap_or_default(),
        ));
    }
    tracing::debug!(count = records.len(), "read bugreport records");
    Ok(records)
}

/// Timestamps are TEXT in current app versions but integers in older ones
fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}
