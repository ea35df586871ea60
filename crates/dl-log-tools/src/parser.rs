//! Parser for the store's log record format.
//!
//! Records look like:
//!
//! ```text
//! [2024-01-15 10:00:00.123 GMT] ERROR PipelineCallServlet|1234|Sites-Site|Product-Show custom.ProductController [] Error: Product not found
//! ```
//!
//! Lines without a header continue the previous record (stack traces).

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use dl_protocol::{LogLevel, ProcessedLogEntry};

static RE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[(\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?)(?:\s*(?:GMT|UTC|Z))?\]\s+(ERROR|WARN|INFO|DEBUG|FATAL)\b\s*(.*)$",
    )
    .unwrap()
});

// Optional `category [context]` or bare `[context]`, optional `- ` separator.
static RE_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\S+\.\S+)\s+\[[^\]]*\]\s*|\[[^\]]*\]\s*)?(?:-\s+)?(.*)$").unwrap()
});

/// Parse a log file's text into records.
pub fn parse_entries(content: &str) -> Vec<ProcessedLogEntry> {
    let mut entries: Vec<ProcessedLogEntry> = Vec::new();

    for line in content.lines() {
        if let Some(entry) = parse_header(line) {
            entries.push(entry);
            continue;
        }
        // Continuation of the previous record; text before the first header is dropped.
        if let Some(last) = entries.last_mut() {
            if !line.trim().is_empty() {
                last.content.push('\n');
                last.content.push_str(line);
            }
        }
    }
    entries
}

/// Parse a single header line, or `None` if the line is not a record header.
pub fn parse_header(line: &str) -> Option<ProcessedLogEntry> {
    let caps = RE_HEADER.captures(line)?;
    let timestamp = parse_timestamp(&caps[1]);
    let level = match &caps[2] {
        "FATAL" => LogLevel::Error,
        token => token.parse().ok()?,
    };
    let rest = caps[3].trim();

    let (thread, body) = match rest.split_once(char::is_whitespace) {
        Some((first, remainder)) if first.contains('|') => (Some(first), remainder.trim_start()),
        _ => (None, rest),
    };

    let (category, message) = match RE_BODY.captures(body) {
        Some(b) => (
            b.get(1).map(|m| m.as_str()),
            b.get(2).map_or(body, |m| m.as_str()),
        ),
        None => (None, body),
    };

    let source = category
        .and_then(|c| c.strip_prefix("custom."))
        .or_else(|| thread.and_then(|t| t.split('|').next()))
        .or(category)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(ProcessedLogEntry {
        level,
        timestamp,
        source,
        content: message.trim().to_string(),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
