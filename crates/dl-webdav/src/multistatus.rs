//! PROPFIND `207 Multi-Status` body parsing.
//!
//! Servers disagree on namespace prefixes (`D:`, `d:`, `lp1:`, none), so
//! elements are matched by local name with any prefix.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::{DavError, DavResult};

/// Resolves origin-relative hrefs.
static ORIGIN: LazyLock<Url> = LazyLock::new(|| Url::parse("http://localhost/").unwrap());

static RE_RESPONSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?response\b[^>]*>(.*?)</(?:[\w.-]+:)?response\s*>").unwrap()
});

static RE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?href\b[^>]*>(.*?)</(?:[\w.-]+:)?href\s*>").unwrap()
});

static RE_CONTENT_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?getcontentlength\b[^>]*>\s*(\d+)\s*</").unwrap()
});

static RE_LAST_MODIFIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?getlastmodified\b[^>]*>(.*?)</").unwrap()
});

static RE_COLLECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:[\w.-]+:)?collection\b[^>]*/?>").unwrap());

/// One `<response>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropResponse {
    /// Unescaped href, still percent-encoded.
    pub href: String,
    pub is_collection: bool,
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
}

/// Parse every `<response>` in a multistatus body.
pub fn parse(body: &str) -> DavResult<Vec<PropResponse>> {
    if !body.contains("multistatus") {
        return Err(DavError::Parse("missing multistatus element".into()));
    }

    RE_RESPONSE
        .captures_iter(body)
        .map(|caps| {
            let block = &caps[1];
            let href = RE_HREF
                .captures(block)
                .map(|c| unescape(c[1].trim()))
                .ok_or_else(|| DavError::Parse("response without href".into()))?;
            let content_length = RE_CONTENT_LENGTH
                .captures(block)
                .and_then(|c| c[1].parse().ok());
            let last_modified = RE_LAST_MODIFIED
                .captures(block)
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty());
            Ok(PropResponse {
                is_collection: RE_COLLECTION.is_match(block) || href.ends_with('/'),
                href,
                content_length,
                last_modified,
            })
        })
        .collect()
}

/// Reduce an href (absolute URL or absolute path) to its path component,
/// still percent-encoded. Query and fragment are dropped.
pub fn href_path(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => ORIGIN
            .join(href)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| href.to_string()),
    }
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
