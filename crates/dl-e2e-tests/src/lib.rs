//! End-to-end tests for davlog live under `tests/`.
//!
//! They drive discovery, reads and analysis through the real
//! `HttpWebDavClient` against a `wiremock` server speaking PROPFIND and
//! ranged GET, and through `MockWebDav` for the agent command paths.
