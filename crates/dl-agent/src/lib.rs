//! davlog agent: library half of the `dl-agent` binary.
//!
//! Exposes config loading and command execution so integration tests can
//! drive the same paths the binary does.

pub mod commands;
pub mod config;
