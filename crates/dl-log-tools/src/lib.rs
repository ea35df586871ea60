//! Log tools for a WebDAV-hosted log store.
//!
//! Three layers, each usable on its own:
//! - `discovery`: list, filter and sort standard and per-job log files
//! - `reader`: full, head and tail reads using byte ranges, with explicit
//!   degraded outcomes, plus bounded batch reads
//! - `analyzer`: level counts, key issues, pattern maps, health score,
//!   trends and recommendations over fetched content
//!
//! `parser` turns raw log text into `ProcessedLogEntry` values for the
//! analyzer, and `samples` provides a populated `MockWebDav` for tests.

pub mod analyzer;
pub mod concurrency;
pub mod config;
pub mod discovery;
pub mod error;
pub mod parser;
pub mod reader;
pub mod samples;

// Re-export key types for convenience
pub use analyzer::LogAnalyzer;
pub use concurrency::BatchRunner;
pub use config::LogToolsConfig;
pub use discovery::{JobLogFilter, LevelFilter, LogDiscovery};
pub use error::{LogError, LogResult};
pub use reader::{FetchOutcome, FileInfo, LogReader, ReadMode, ReadOptions};
