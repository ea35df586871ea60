//! The `WebDavClient` trait and the loosely-typed values it returns.
//!
//! Listing entries carry the server's raw `lastmod` string (an HTTP date),
//! which callers narrow into their own types. Names and paths are decoded on
//! the way in and encoded again by the transport, so callers pass them back
//! unchanged.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::DavResult;

/// Kind of a listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavEntry {
    pub kind: EntryKind,
    /// Last path segment, percent-decoded.
    pub basename: String,
    /// Decoded path relative to the log root.
    pub path: String,
    /// Content length in bytes, when reported.
    pub size: Option<u64>,
    /// Raw `getlastmodified` value, e.g. `Mon, 15 Jan 2024 12:00:00 GMT`.
    pub lastmod: Option<String>,
}

impl DavEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Result of a single-file stat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DavStat {
    pub size: Option<u64>,
    pub lastmod: Option<String>,
}

/// Body of a ranged read, delivered in chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = DavResult<Bytes>> + Send>>;

/// Remote store operations the log tools depend on.
///
/// Paths are relative to the configured log root. Directory paths may end
/// with `/`.
#[async_trait]
pub trait WebDavClient: Send + Sync {
    /// List the direct children of a directory (PROPFIND, depth 1).
    async fn list_directory(&self, path: &str) -> DavResult<Vec<DavEntry>>;

    /// Stat a single file.
    async fn stat(&self, path: &str) -> DavResult<DavStat>;

    /// Fetch a whole file as text.
    async fn get_text(&self, path: &str) -> DavResult<String>;

    /// Open a ranged read of `[start, end]`, both offsets inclusive.
    async fn get_range(&self, path: &str, start: u64, end: u64) -> DavResult<ByteStream>;
}
