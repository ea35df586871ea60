//! Log content reader: full, head and tail reads over byte ranges.
//!
//! Every content read returns a `FetchOutcome`. When a cheaper path fails
//! (stat, ranged stream) the reader falls back once to a full fetch and
//! reports the result as `Degraded` so callers can tell.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::HashMap;

use dl_webdav::WebDavClient;

use crate::concurrency::{BatchRunner, with_deadline};
use crate::config::LogToolsConfig;
use crate::discovery::parse_lastmod;
use crate::error::{LogError, LogResult};

// ── Outcomes & options ────────────────────────────────────────

/// Content of a read, and whether it came from a fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Complete(String),
    Degraded { content: String, reason: String },
}

impl FetchOutcome {
    pub fn content(&self) -> &str {
        match self {
            Self::Complete(content) | Self::Degraded { content, .. } => content,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            Self::Complete(content) | Self::Degraded { content, .. } => content,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Existence and metadata of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub exists: bool,
    pub size: Option<u64>,
    pub lastmod: Option<DateTime<Utc>>,
}

/// Which part of each file `read_multiple_files` fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    #[default]
    Tail,
    Head,
    Full,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    pub mode: ReadMode,
    /// Byte limit for head/tail reads; tail falls back to the configured default.
    pub max_bytes: Option<u64>,
}

// ── Reader ────────────────────────────────────────────────────

/// Reads log content from a remote store.
pub struct LogReader<'a> {
    client: &'a dyn WebDavClient,
    config: &'a LogToolsConfig,
}

impl<'a> LogReader<'a> {
    pub fn new(client: &'a dyn WebDavClient, config: &'a LogToolsConfig) -> Self {
        Self { client, config }
    }

    /// The last `max_bytes` bytes of a file (default from config).
    ///
    /// Files no larger than the limit, or of unknown size, are fetched whole.
    /// If stat fails the whole file is returned untruncated.
    pub async fn get_file_contents_tail(
        &self,
        filename: &str,
        max_bytes: Option<u64>,
    ) -> LogResult<FetchOutcome> {
        let max_bytes = max_bytes.unwrap_or(self.config.default_tail_bytes);
        with_deadline(self.config.call_timeout(), "tail read", self.tail(filename, max_bytes)).await
    }

    /// The first `max_bytes` bytes of a file, or all of it when no limit is given.
    ///
    /// If stat fails the whole file is fetched and truncated locally.
    pub async fn get_file_contents_head(
        &self,
        filename: &str,
        max_bytes: Option<u64>,
    ) -> LogResult<FetchOutcome> {
        with_deadline(self.config.call_timeout(), "head read", self.head(filename, max_bytes)).await
    }

    /// Existence, size and modification time. Never fails.
    pub async fn get_file_info(&self, filename: &str) -> FileInfo {
        let stat = tokio::time::timeout(self.config.call_timeout(), self.client.stat(filename)).await;
        match stat {
            Ok(Ok(stat)) => FileInfo {
                exists: true,
                size: stat.size,
                lastmod: parse_lastmod(stat.lastmod.as_deref()),
            },
            Ok(Err(e)) => {
                tracing::debug!(file = %filename, error = %e, "file not available");
                FileInfo::default()
            }
            Err(_) => {
                tracing::warn!(file = %filename, "stat deadline exceeded");
                FileInfo::default()
            }
        }
    }

    /// Read many files in sequential batches of `batch_size` concurrent reads.
    ///
    /// Files that fail are logged and left out of the result.
    pub async fn read_multiple_files(
        &self,
        filenames: &[String],
        options: ReadOptions,
    ) -> HashMap<String, String> {
        let runner = BatchRunner::new(self.config.batch_size);
        let results = runner
            .run(filenames, |name| async move {
                let outcome = match options.mode {
                    ReadMode::Tail => self.get_file_contents_tail(name, options.max_bytes).await,
                    ReadMode::Head => self.get_file_contents_head(name, options.max_bytes).await,
                    ReadMode::Full => {
                        with_deadline(self.config.call_timeout(), "full read", self.full(name))
                            .await
                            .map(FetchOutcome::Complete)
                    }
                };
                (name, outcome)
            })
            .await;

        let mut contents = HashMap::with_capacity(results.len());
        for (name, outcome) in results {
            match outcome {
                Ok(outcome) => {
                    contents.insert(name.clone(), outcome.into_content());
                }
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping unreadable file");
                }
            }
        }
        tracing::debug!(
            requested = filenames.len(),
            read = contents.len(),
            "batch read finished"
        );
        contents
    }

    async fn tail(&self, filename: &str, max_bytes: u64) -> LogResult<FetchOutcome> {
        if max_bytes == 0 {
            return Ok(FetchOutcome::Complete(String::new()));
        }
        match self.client.stat(filename).await {
            Ok(stat) => match stat.size {
                Some(size) if size > max_bytes => {
                    self.get_range_file_contents(filename, size - max_bytes, size - 1)
                        .await
                }
                _ => self.full(filename).await.map(FetchOutcome::Complete),
            },
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "stat failed, reading whole file for tail");
                let content = self.full(filename).await?;
                Ok(FetchOutcome::Degraded {
                    content,
                    reason: format!("stat failed: {e}"),
                })
            }
        }
    }

    async fn head(&self, filename: &str, max_bytes: Option<u64>) -> LogResult<FetchOutcome> {
        let Some(max_bytes) = max_bytes else {
            return self.full(filename).await.map(FetchOutcome::Complete);
        };
        if max_bytes == 0 {
            return Ok(FetchOutcome::Complete(String::new()));
        }
        match self.client.stat(filename).await {
            Ok(stat) => match stat.size {
                Some(size) if size > max_bytes => {
                    self.get_range_file_contents(filename, 0, max_bytes - 1).await
                }
                _ => self.full(filename).await.map(FetchOutcome::Complete),
            },
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "stat failed, truncating whole file for head");
                let mut content = self.full(filename).await?;
                truncate_to_bytes(&mut content, max_bytes);
                Ok(FetchOutcome::Degraded {
                    content,
                    reason: format!("stat failed: {e}"),
                })
            }
        }
    }

    /// Ranged read of `[start, end]`, inclusive.
    ///
    /// On stream failure the whole file is fetched instead; it is cut to the
    /// range length only when the range started at 0.
    async fn get_range_file_contents(
        &self,
        filename: &str,
        start: u64,
        end: u64,
    ) -> LogResult<FetchOutcome> {
        let failure = match self.collect_range(filename, start, end).await {
            Ok(bytes) => {
                tracing::debug!(file = %filename, start, end, bytes = bytes.len(), "range read");
                // Offsets may split a multi-byte character at either end.
                return Ok(FetchOutcome::Complete(
                    String::from_utf8_lossy(&bytes).into_owned(),
                ));
            }
            Err(e) => e,
        };

        tracing::warn!(file = %filename, start, end, error = %failure, "range read failed, fetching whole file");
        let mut content = self.full(filename).await?;
        let range_len = end - start + 1;
        if start == 0 && content.len() as u64 > range_len {
            truncate_to_bytes(&mut content, range_len);
        }
        Ok(FetchOutcome::Degraded {
            content,
            reason: format!("range read failed: {failure}"),
        })
    }

    async fn collect_range(&self, filename: &str, start: u64, end: u64) -> dl_webdav::DavResult<Vec<u8>> {
        let mut stream = self.client.get_range(filename, start, end).await?;
        let mut buf = Vec::with_capacity((end - start + 1).min(16 * 1024 * 1024) as usize);
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    async fn full(&self, filename: &str) -> LogResult<String> {
        self.client
            .get_text(filename)
            .await
            .map_err(|e| LogError::Fetch {
                path: filename.to_string(),
                cause: e.to_string(),
            })
    }
}

/// Cut `s` to at most `max_bytes` bytes, backing off to a char boundary.
fn truncate_to_bytes(s: &mut String, max_bytes: u64) {
    let Ok(max) = usize::try_from(max_bytes) else {
        return;
    };
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
