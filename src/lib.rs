//! Library exports for the `rrational` binary, benchmarks and tests.
/// Per-user application directories.
pub mod app_dirs;
/// Crash-safe file replacement.
pub mod atomic_file;
/// Ingestion settings stored as TOML.
pub mod config;
/// Versioned per-participant correction store.
pub mod corrections;
/// Logging configuration helpers.
pub mod logging;
/// Discovery and parsing of device exports.
pub mod recordings;
