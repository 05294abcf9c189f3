use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::models::{record::AGGREGATE_CSV_HEADER, LogRecord};

/// Durable destination for flushed window summaries.
pub trait RecordSink: Send {
    fn append(&mut self, record: &LogRecord) -> Result<()>;
}

/// Append-only CSV file. The header goes in when the file is new or empty.
#[derive(Debug, Clone)]
pub struct CsvRecordLog {
    path: PathBuf,
}

impl CsvRecordLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvRecordLog {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        append_csv_row(&self.path, AGGREGATE_CSV_HEADER, &record.to_csv_row())
    }
}

/// Append `row` to `path`, writing `header` first if the file holds nothing yet.
pub fn append_csv_row(path: &Path, header: &str, row: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let is_empty = file
        .metadata()
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len()
        == 0;

    let mut chunk = String::new();
    if is_empty {
        chunk.push_str(header);
        chunk.push('\n');
    }
    chunk.push_str(row);
    chunk.push('\n');

    file.write_all(chunk.as_bytes())
        .with_context(|| format!("failed to append to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(mean_flex: f64) -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            mean_angle_y: 1.0,
            mean_angle_z: 2.0,
            mean_flex_angle: mean_flex,
            min_flex_angle: mean_flex,
            max_flex_angle: mean_flex,
        }
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvRecordLog::new(dir.path().join("posture_log.csv"));

        log.append(&record(10.0)).unwrap();
        log.append(&record(11.0)).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], AGGREGATE_CSV_HEADER);
        assert!(lines[1].ends_with(",1.00,2.00,10.0,10.0,10.0"));
        assert!(lines[2].ends_with(",1.00,2.00,11.0,11.0,11.0"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/posture_log.csv");
        let mut log = CsvRecordLog::new(&path);

        log.append(&record(5.0)).unwrap();
        assert!(path.exists());
    }
}
