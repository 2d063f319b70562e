//! Sled-backed log of report files that were already emailed.
//!
//! Keys are absolute report paths, values are JSON [`SentRecord`]s. The pipeline
//! consults it before classifying so a report is never sent twice.

use crate::error::ReportLogError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

const TREE_NAME: &str = "sent_reports";

/// One sent report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentRecord {
    pub path: String,
    /// Unix timestamp (milliseconds) of the successful send.
    pub sent_at_ms: i64,
}

impl SentRecord {
    /// Serializes to JSON bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReportLogError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReportLogError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Resolves a report path to the absolute form used as its log key.
///
/// Existing files are canonicalized. Other paths are joined onto the working directory
/// with `.` and `..` components removed lexically.
pub fn resolve_report_path(path: &Path) -> std::io::Result<PathBuf> {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return Ok(canonical);
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}

/// Storage seam for the sent-report log.
pub trait SentReportLog: Send + Sync {
    fn get_record(&self, path: &Path) -> Result<Option<SentRecord>, ReportLogError>;

    fn mark_sent(&self, path: &Path, sent_at_ms: i64) -> Result<(), ReportLogError>;

    fn is_sent(&self, path: &Path) -> Result<bool, ReportLogError> {
        Ok(self.get_record(path)?.is_some())
    }
}

/// Sent-report log stored in a sled tree.
pub struct ReportLog {
    db: sled::Db,
}

impl ReportLog {
    /// Opens or creates the log at the given directory.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, ReportLogError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn key_for(path: &Path) -> Result<String, ReportLogError> {
        Ok(resolve_report_path(path)?.to_string_lossy().into_owned())
    }
}

impl SentReportLog for ReportLog {
    fn get_record(&self, path: &Path) -> Result<Option<SentRecord>, ReportLogError> {
        let key = Self::key_for(path)?;
        let tree = self.db.open_tree(TREE_NAME)?;
        match tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(SentRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn mark_sent(&self, path: &Path, sent_at_ms: i64) -> Result<(), ReportLogError> {
        let key = Self::key_for(path)?;
        let record = SentRecord { path: key.clone(), sent_at_ms };
        let tree = self.db.open_tree(TREE_NAME)?;
        let prev = tree.insert(key.as_bytes(), record.to_bytes()?)?;
        tree.flush()?;
        tracing::info!(
            target: "atta::report_log",
            action = if prev.is_some() { "UPDATE" } else { "INSERT" },
            "Marked report as sent: {}",
            key
        );
        Ok(())
    }
}
