//! Error taxonomy: configuration errors, malformed input, and fatal protocol violations.

use thiserror::Error;

/// `ProtocolInvariantViolation`s never flow through this enum — per SPEC_FULL.md §7 they're
/// unrecoverable, so they're raised as panics (see `cache.rs`/`bus.rs` assertions) rather than
/// propagated as a `Result` the caller might paper over. `SimError` covers the two error classes
/// that *are* meant to be caught and reported: bad configuration and bad input.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("input error in {file} at line {line}: {message}")]
    Input {
        file: String,
        line: usize,
        message: String,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
