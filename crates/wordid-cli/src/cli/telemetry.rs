//! Structured logging for the operator tool.
//!
//! Filtering follows `RUST_LOG` and falls back to `info`, which shows one line
//! per issued alias during a simulation. Use `RUST_LOG=warn` to keep only the
//! summary tables, or `RUST_LOG=wordid=debug` to see every shard pick.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber. Logs go to stderr so the summary
/// printed on stdout stays machine-readable.
pub fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .init();
}
