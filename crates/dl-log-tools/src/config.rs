//! Tunables injected into discovery, reader and analyzer at construction.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{LogError, LogResult};

/// Log tool settings, loadable from the `[tools]` table of the agent config.
#[derive(Debug, Clone, Deserialize)]
pub struct LogToolsConfig {
    /// Reads issued concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Bytes returned by a tail read when the caller gives no limit.
    #[serde(default = "default_tail_bytes")]
    pub default_tail_bytes: u64,
    /// Most recent files kept by the "all files" listing.
    #[serde(default = "default_all_files_limit")]
    pub all_files_limit: usize,
    /// Job logs returned by the latest/search helpers when no limit is given.
    #[serde(default = "default_job_limit")]
    pub default_job_limit: usize,
    /// Key issues taken from a single error file.
    #[serde(default = "default_max_key_issues")]
    pub max_key_issues_per_file: usize,
    /// Deadline for one discovery or reader call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Directory holding one subdirectory per job.
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: String,
}

fn default_batch_size() -> usize {
    5
}
fn default_tail_bytes() -> u64 {
    1024 * 1024
}
fn default_all_files_limit() -> usize {
    50
}
fn default_job_limit() -> usize {
    10
}
fn default_max_key_issues() -> usize {
    10
}
fn default_call_timeout_secs() -> u64 {
    60
}
fn default_jobs_dir() -> String {
    "jobs".into()
}

impl Default for LogToolsConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            default_tail_bytes: default_tail_bytes(),
            all_files_limit: default_all_files_limit(),
            default_job_limit: default_job_limit(),
            max_key_issues_per_file: default_max_key_issues(),
            call_timeout_secs: default_call_timeout_secs(),
            jobs_dir: default_jobs_dir(),
        }
    }
}

impl LogToolsConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Reject settings that would stall or empty every call.
    pub fn validate(&self) -> LogResult<()> {
        if self.batch_size == 0 {
            return Err(LogError::Config("batch_size must be at least 1".into()));
        }
        if self.call_timeout_secs == 0 {
            return Err(LogError::Config("call_timeout_secs must be at least 1".into()));
        }
        if self.jobs_dir.trim_matches('/').is_empty() {
            return Err(LogError::Config("jobs_dir must not be empty".into()));
        }
        Ok(())
    }
}
