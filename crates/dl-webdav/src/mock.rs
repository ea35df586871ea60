//! Mock WebDAV store for testing without a server.
//!
//! Serves pre-loaded files, synthesizes directory listings from their paths,
//! injects failures per path, and records ranged reads and peak concurrency
//! for assertion in tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::client::{ByteStream, DavEntry, DavStat, EntryKind, WebDavClient};
use crate::error::{DavError, DavResult};

/// A recorded `get_range` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    pub path: String,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone)]
struct MockFile {
    content: Vec<u8>,
    lastmod: Option<DateTime<Utc>>,
    report_size: bool,
}

/// In-memory implementation of `WebDavClient`.
///
/// Paths are stored without leading or trailing slashes.
#[derive(Default)]
pub struct MockWebDav {
    files: BTreeMap<String, MockFile>,
    dirs: BTreeSet<String>,
    failing_lists: HashSet<String>,
    failing_stats: HashSet<String>,
    failing_gets: HashSet<String>,
    failing_ranges: HashSet<String>,
    broken_streams: HashSet<String>,
    delay: Option<Duration>,
    slow_paths: HashMap<String, Duration>,
    ranges: Mutex<Vec<RangeRequest>>,
    full_reads: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

impl MockWebDav {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with no modification time.
    pub fn add_file(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.insert(path, content.into(), None);
    }

    /// Add a file with a modification time.
    pub fn add_file_at(&mut self, path: &str, content: impl Into<Vec<u8>>, lastmod: DateTime<Utc>) {
        self.insert(path, content.into(), Some(lastmod));
    }

    /// Add an empty directory.
    pub fn add_dir(&mut self, path: &str) {
        self.dirs.insert(normalize(path));
    }

    /// Listing `path` fails.
    pub fn fail_list(&mut self, path: &str) {
        self.failing_lists.insert(normalize(path));
    }

    /// Stat of `path` fails.
    pub fn fail_stat(&mut self, path: &str) {
        self.failing_stats.insert(normalize(path));
    }

    /// Full reads of `path` fail.
    pub fn fail_get(&mut self, path: &str) {
        self.failing_gets.insert(normalize(path));
    }

    /// Opening a ranged read of `path` fails.
    pub fn fail_range(&mut self, path: &str) {
        self.failing_ranges.insert(normalize(path));
    }

    /// Ranged reads of `path` yield one chunk and then an error.
    pub fn break_stream(&mut self, path: &str) {
        self.broken_streams.insert(normalize(path));
    }

    /// Stat of `path` succeeds but reports no size.
    pub fn hide_size(&mut self, path: &str) {
        if let Some(file) = self.files.get_mut(&normalize(path)) {
            file.report_size = false;
        }
    }

    /// Delay every operation, to make overlapping calls observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay only operations on `path`, on top of any global delay.
    pub fn slow_path(&mut self, path: &str, delay: Duration) {
        self.slow_paths.insert(normalize(path), delay);
    }

    /// All ranged reads issued so far.
    pub fn range_requests(&self) -> Vec<RangeRequest> {
        self.ranges.lock().unwrap().clone()
    }

    /// Paths fetched with `get_text` so far.
    pub fn full_reads(&self) -> Vec<String> {
        self.full_reads.lock().unwrap().clone()
    }

    /// Highest number of operations observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn insert(&mut self, path: &str, content: Vec<u8>, lastmod: Option<DateTime<Utc>>) {
        let path = normalize(path);
        let mut parent = parent_of(&path);
        while !parent.is_empty() {
            self.dirs.insert(parent.to_string());
            parent = parent_of(parent);
        }
        self.files.insert(
            path,
            MockFile {
                content,
                lastmod,
                report_size: true,
            },
        );
    }

    fn file(&self, path: &str) -> DavResult<&MockFile> {
        self.files
            .get(path)
            .ok_or_else(|| DavError::NotFound(path.to_string()))
    }

    async fn enter(&self, path: &str) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        let delay = self.delay.unwrap_or_default() + self.slow_paths.get(path).copied().unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        guard
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WebDavClient for MockWebDav {
    async fn list_directory(&self, path: &str) -> DavResult<Vec<DavEntry>> {
        let dir = normalize(path);
        let _guard = self.enter(&dir).await;
        if self.failing_lists.contains(&dir) {
            return Err(DavError::Status {
                status: 500,
                path: dir,
            });
        }
        if !dir.is_empty() && !self.dirs.contains(&dir) {
            return Err(DavError::NotFound(dir));
        }

        let mut entries: Vec<DavEntry> = self
            .dirs
            .iter()
            .filter(|d| parent_of(d) == dir)
            .map(|d| DavEntry {
                kind: EntryKind::Directory,
                basename: d.rsplit('/').next().unwrap_or_default().to_string(),
                path: d.clone(),
                size: None,
                lastmod: None,
            })
            .collect();

        entries.extend(
            self.files
                .iter()
                .filter(|(p, _)| parent_of(p) == dir)
                .map(|(p, f)| DavEntry {
                    kind: EntryKind::File,
                    basename: p.rsplit('/').next().unwrap_or_default().to_string(),
                    path: p.clone(),
                    size: Some(f.content.len() as u64),
                    lastmod: f.lastmod.map(|t| t.to_rfc2822()),
                }),
        );
        Ok(entries)
    }

    async fn stat(&self, path: &str) -> DavResult<DavStat> {
        let path = normalize(path);
        let _guard = self.enter(&path).await;
        if self.failing_stats.contains(&path) {
            return Err(DavError::Status { status: 500, path });
        }
        let file = self.file(&path)?;
        Ok(DavStat {
            size: file.report_size.then_some(file.content.len() as u64),
            lastmod: file.lastmod.map(|t| t.to_rfc2822()),
        })
    }

    async fn get_text(&self, path: &str) -> DavResult<String> {
        let path = normalize(path);
        let _guard = self.enter(&path).await;
        self.full_reads.lock().unwrap().push(path.clone());
        if self.failing_gets.contains(&path) {
            return Err(DavError::Status { status: 500, path });
        }
        let file = self.file(&path)?;
        Ok(String::from_utf8_lossy(&file.content).into_owned())
    }

    async fn get_range(&self, path: &str, start: u64, end: u64) -> DavResult<ByteStream> {
        let path = normalize(path);
        let _guard = self.enter(&path).await;
        self.ranges.lock().unwrap().push(RangeRequest {
            path: path.clone(),
            start,
            end,
        });
        if self.failing_ranges.contains(&path) {
            return Err(DavError::Status { status: 416, path });
        }
        let file = self.file(&path)?;
        let len = file.content.len() as u64;
        if start >= len || end < start {
            return Err(DavError::Status { status: 416, path });
        }
        let slice = &file.content[start as usize..=end.min(len - 1) as usize];

        let chunks: Vec<DavResult<Bytes>> = if self.broken_streams.contains(&path) {
            let half = slice.len() / 2;
            vec![
                Ok(Bytes::copy_from_slice(&slice[..half])),
                Err(DavError::Stream("connection reset".into())),
            ]
        } else {
            slice
                .chunks(64 * 1024)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect()
        };
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
