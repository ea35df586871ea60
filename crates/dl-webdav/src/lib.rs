//! WebDAV transport for davlog.
//!
//! Provides the remote-store boundary the log tools read through:
//! - `WebDavClient` trait for listing, stat, full and ranged reads (mockable)
//! - `HttpWebDavClient` speaking PROPFIND/GET over `reqwest`
//! - `MockWebDav` for tests, with failure injection and request recording
//! - `multistatus` parsing of PROPFIND responses into `DavEntry` values

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod multistatus;

// Re-exports for convenience.
pub use client::{ByteStream, DavEntry, DavStat, EntryKind, WebDavClient};
pub use config::DavConfig;
pub use error::{DavError, DavResult};
pub use http::HttpWebDavClient;
pub use mock::{MockWebDav, RangeRequest};
