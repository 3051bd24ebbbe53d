use thiserror::Error;

/// Failures while writing run output.  Observers and handlers keep the
/// first one; see [`SharedWriter::take_error`][crate::SharedWriter::take_error].
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot write output files: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite output failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type OutputResult<T> = Result<T, OutputError>;
