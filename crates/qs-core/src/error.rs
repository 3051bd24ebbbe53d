//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` with a
//! `#[from]` variant where configuration problems can surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("time {secs} s lies before the simulation start {start} s")]
    BeforeStart { secs: u64, start: u64 },
}

/// Shorthand result type for `qs-core`.
pub type CoreResult<T> = Result<T, CoreError>;
