use thiserror::Error;

/// Errors from the file-level surface. The formatting core itself is total.
#[derive(Error, Debug)]
pub enum SqlstyleError {
    #[error("sqlstyle config error: {0}")]
    Config(String),

    #[error("sqlstyle equivalence error: {0}")]
    Equivalence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SqlstyleError>;
