use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorkitError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Identity underivable: {0}")]
    IdentityError(String),
    #[error("Catalog consistency error: {0}")]
    ConsistencyError(String),
    #[error("Not located: {0}")]
    LocationError(String),
    #[error("Ambiguous match: {0}")]
    AmbiguityError(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}
