//! Log file discovery: list, filter and sort root logs and per-job logs.
//!
//! Listing entries from the transport are narrowed into `LogFileMetadata`
//! and `JobLogInfo` here, before any filtering touches them.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use dl_protocol::{JobLogInfo, LogFileInfo, LogFileListing, LogFileMetadata, LogFileStats, LogLevel};
use dl_webdav::{DavEntry, WebDavClient};

use crate::concurrency::{BatchRunner, with_deadline};
use crate::config::LogToolsConfig;
use crate::error::{LogError, LogResult};

static RE_JOB_FILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Job-.+-[^.]+\.log$").unwrap());

static RE_JOB_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Job-.+-([^.]+)\.log$").unwrap());

// ── Filters ───────────────────────────────────────────────────

/// Level filter for root log files.
#[derive(Debug, Clone, Copy)]
pub struct LevelFilter {
    /// None lets every file through.
    pub level: Option<LogLevel>,
    /// Also accept `custom<Level>-` files.
    pub include_custom: bool,
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self {
            level: None,
            include_custom: true,
        }
    }
}

impl LevelFilter {
    pub fn level(level: LogLevel) -> Self {
        Self {
            level: Some(level),
            ..Self::default()
        }
    }
}

/// Filter for job log listings.
#[derive(Debug, Clone)]
pub struct JobLogFilter {
    /// Case-insensitive substring of the job name.
    pub job_name: Option<String>,
    pub limit: Option<usize>,
    /// Most recent first; otherwise listing order.
    pub sort_by_recent: bool,
}

impl Default for JobLogFilter {
    fn default() -> Self {
        Self {
            job_name: None,
            limit: None,
            sort_by_recent: true,
        }
    }
}

// ── Discovery ─────────────────────────────────────────────────

/// Discovers log files on a remote store.
pub struct LogDiscovery<'a> {
    client: &'a dyn WebDavClient,
    config: &'a LogToolsConfig,
}

impl<'a> LogDiscovery<'a> {
    pub fn new(client: &'a dyn WebDavClient, config: &'a LogToolsConfig) -> Self {
        Self { client, config }
    }

    /// Root `.log` files whose name contains `date` (default: today, `YYYYMMDD`).
    pub async fn get_log_files(&self, date: Option<&str>) -> LogResult<Vec<LogFileMetadata>> {
        let token = date.map_or_else(today_token, str::to_string);
        let entries = self.list_root().await?;
        let files: Vec<LogFileMetadata> = entries
            .iter()
            .filter(|e| e.is_file() && e.basename.contains(&token) && e.basename.ends_with(".log"))
            .map(narrow_file)
            .collect();
        tracing::debug!(date = %token, count = files.len(), "log files discovered");
        Ok(files)
    }

    /// Root log files of one level for a date.
    pub async fn get_log_files_by_level(
        &self,
        level: LogLevel,
        date: Option<&str>,
    ) -> LogResult<Vec<LogFileMetadata>> {
        let files = self.get_log_files(date).await?;
        Ok(filter_log_files(&files, LevelFilter::level(level)))
    }

    /// The most recent `.log` files in the root, plus how many exist in total.
    pub async fn get_all_log_files(&self) -> LogResult<LogFileListing> {
        let entries = self.list_root().await?;
        let logs: Vec<LogFileMetadata> = entries
            .iter()
            .filter(|e| e.is_file() && e.basename.ends_with(".log"))
            .map(narrow_file)
            .collect();
        let total_count = logs.len();

        let files = sort_files_by_date(logs, true)
            .into_iter()
            .take(self.config.all_files_limit)
            .map(|f| LogFileInfo {
                name: f.filename,
                size: f.size,
                last_modified: f.lastmod,
            })
            .collect();
        Ok(LogFileListing { files, total_count })
    }

    /// Levels that have at least one file for a date, most severe first.
    pub async fn get_available_log_levels(&self, date: Option<&str>) -> LogResult<Vec<LogLevel>> {
        let files = self.get_log_files(date).await?;
        Ok(LogLevel::ALL
            .into_iter()
            .filter(|level| !filter_log_files(&files, LevelFilter::level(*level)).is_empty())
            .collect())
    }

    /// Counts, total size and oldest/newest file for a date.
    pub async fn get_log_file_stats(&self, date: Option<&str>) -> LogResult<LogFileStats> {
        let files = self.get_log_files(date).await?;
        let files_by_level: BTreeMap<LogLevel, usize> = LogLevel::ALL
            .into_iter()
            .map(|level| (level, filter_log_files(&files, LevelFilter::level(level)).len()))
            .collect();
        let total_size = files.iter().map(|f| f.size).sum();
        let total_files = files.len();

        let sorted = sort_files_by_date(files, true);
        Ok(LogFileStats {
            total_files,
            files_by_level,
            total_size,
            newest_file: sorted.first().map(|f| f.filename.clone()),
            oldest_file: sorted.last().map(|f| f.filename.clone()),
        })
    }

    /// Job execution logs under the jobs directory.
    ///
    /// Failing to list the jobs directory is fatal. Failing to list one
    /// job's directory skips that job.
    pub async fn get_job_log_files(&self, filter: &JobLogFilter) -> LogResult<Vec<JobLogInfo>> {
        let jobs_dir = self.config.jobs_dir.trim_matches('/');
        let entries = with_deadline(self.config.call_timeout(), "list jobs", async {
            self.client
                .list_directory(&format!("{jobs_dir}/"))
                .await
                .map_err(|e| LogError::Listing {
                    path: format!("{jobs_dir}/"),
                    cause: e.to_string(),
                })
        })
        .await?;

        let needle = filter.job_name.as_ref().map(|n| n.to_lowercase());
        let job_dirs: Vec<(String, &DavEntry)> = entries
            .iter()
            .filter(|e| e.is_directory())
            .map(|e| (e.basename.clone(), e))
            .filter(|(name, _)| {
                needle
                    .as_ref()
                    .is_none_or(|n| name.to_lowercase().contains(n.as_str()))
            })
            .collect();

        let runner = BatchRunner::new(self.config.batch_size);
        let per_job = runner
            .run(job_dirs, |(job_name, dir)| async move {
                self.list_job_dir(jobs_dir, job_name, dir).await
            })
            .await;

        let mut logs: Vec<JobLogInfo> = per_job.into_iter().flatten().collect();
        if filter.sort_by_recent {
            logs.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        }
        if let Some(limit) = filter.limit {
            logs.truncate(limit);
        }
        Ok(logs)
    }

    /// Most recent job logs across all jobs.
    pub async fn get_latest_job_log_files(&self, limit: Option<usize>) -> LogResult<Vec<JobLogInfo>> {
        self.get_job_log_files(&JobLogFilter {
            limit: Some(limit.unwrap_or(self.config.default_job_limit)),
            ..JobLogFilter::default()
        })
        .await
    }

    /// Most recent logs of jobs whose name contains `job_name`.
    pub async fn search_job_logs_by_name(
        &self,
        job_name: &str,
        limit: Option<usize>,
    ) -> LogResult<Vec<JobLogInfo>> {
        self.get_job_log_files(&JobLogFilter {
            job_name: Some(job_name.to_string()),
            limit: Some(limit.unwrap_or(self.config.default_job_limit)),
            sort_by_recent: true,
        })
        .await
    }

    async fn list_root(&self) -> LogResult<Vec<DavEntry>> {
        with_deadline(self.config.call_timeout(), "list root", async {
            self.client
                .list_directory("/")
                .await
                .map_err(|e| LogError::Listing {
                    path: "/".into(),
                    cause: e.to_string(),
                })
        })
        .await
    }

    /// Job logs of one job directory; empty when the directory cannot be listed.
    async fn list_job_dir(&self, jobs_dir: &str, job_name: String, dir: &DavEntry) -> Vec<JobLogInfo> {
        let path = format!("{jobs_dir}/{}/", dir.basename);
        let listed = with_deadline(self.config.call_timeout(), "list job directory", async {
            self.client
                .list_directory(&path)
                .await
                .map_err(|e| LogError::Listing {
                    path: path.clone(),
                    cause: e.to_string(),
                })
        })
        .await;

        let entries = match listed {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(job = %job_name, error = %e, "skipping job directory");
                return Vec::new();
            }
        };

        entries
            .iter()
            .filter(|e| e.is_file() && RE_JOB_FILE.is_match(&e.basename))
            .map(|e| JobLogInfo {
                job_name: job_name.clone(),
                job_id: extract_job_id_from_filename(&e.basename),
                log_file: format!("{jobs_dir}/{}/{}", dir.basename, e.basename),
                last_modified: parse_lastmod(e.lastmod.as_deref()).unwrap_or_else(Utc::now),
                size: e.size,
            })
            .collect()
    }
}

// ── Pure helpers ──────────────────────────────────────────────

/// Files matching the filter's level (all files when no level is set).
pub fn filter_log_files(files: &[LogFileMetadata], filter: LevelFilter) -> Vec<LogFileMetadata> {
    match filter.level {
        None => files.to_vec(),
        Some(level) => files
            .iter()
            .filter(|f| level.matches_filename(&f.filename, filter.include_custom))
            .cloned()
            .collect(),
    }
}

/// Sort by modification time; newest first when `descending`.
pub fn sort_files_by_date(mut files: Vec<LogFileMetadata>, descending: bool) -> Vec<LogFileMetadata> {
    if descending {
        files.sort_by(|a, b| b.lastmod.cmp(&a.lastmod));
    } else {
        files.sort_by(|a, b| a.lastmod.cmp(&b.lastmod));
    }
    files
}

/// Execution id of a `Job-<name>-<id>.log` file name, or `"unknown"`.
pub fn extract_job_id_from_filename(filename: &str) -> String {
    RE_JOB_ID
        .captures(filename)
        .map_or_else(|| "unknown".to_string(), |c| c[1].to_string())
}

/// Today's date token as used in log file names.
pub fn today_token() -> String {
    Utc::now().format("%Y%m%d").to_string()
}

/// Parse a listing timestamp (HTTP date, falling back to RFC 3339).
pub fn parse_lastmod(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn narrow_file(entry: &DavEntry) -> LogFileMetadata {
    LogFileMetadata {
        filename: entry.basename.clone(),
        lastmod: parse_lastmod(entry.lastmod.as_deref()).unwrap_or_else(Utc::now),
        size: entry.size.unwrap_or(0),
    }
}
