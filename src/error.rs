use thiserror::Error;

/// Errors that are allowed to unwind out of `main`.
///
/// Everything else (decode failures, orphan templates, queue overflow,
/// per-collector forward failures) is a counted value, not a `Result` --
/// see the counters in `stats::counters`.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RelayError>;
