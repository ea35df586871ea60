use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::level::LogLevel;

/// One log file from a root directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileMetadata {
    /// Base name of the file (e.g. `error-blade1-20240101-000000.log`).
    pub filename: String,
    /// Last modification time; "now" when the store omitted it.
    pub lastmod: DateTime<Utc>,
    /// Size in bytes; 0 when the store omitted it.
    #[serde(default)]
    pub size: u64,
}

/// Detailed metadata for the "all files" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileInfo {
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// The most recent log files plus the untruncated count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogFileListing {
    pub files: Vec<LogFileInfo>,
    /// Number of `.log` files present before truncation.
    pub total_count: usize,
}

impl LogFileListing {
    pub fn is_truncated(&self) -> bool {
        self.total_count > self.files.len()
    }
}

/// One job execution's log file under `jobs/<job>/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLogInfo {
    /// URL-decoded job directory name.
    pub job_name: String,
    /// Execution id taken from the file name, or `"unknown"`.
    pub job_id: String,
    /// Path relative to the log root, e.g. `jobs/ImportCatalog/Job-ImportCatalog-42.log`.
    pub log_file: String,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Aggregate statistics over one day's log files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogFileStats {
    pub total_files: usize,
    pub files_by_level: BTreeMap<LogLevel, usize>,
    pub total_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_file: Option<String>,
}
