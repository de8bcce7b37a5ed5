// crates/popdb-core/src/error.rs
use std::fmt;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PopDbError>;

/// Every failure the catalog, the loader and the radius engine can surface.
///
/// Row-level decode problems are *not* in here: they are [`RowError`]s,
/// recovered by the loader's skip stage and only ever logged and counted.
#[derive(Debug, Error)]
pub enum PopDbError {
    /// Table or index creation failed (for example: the table already exists).
    #[error("schema error: {0}")]
    Schema(String),

    /// The gazetteer dump could not be opened or read.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Opening or committing the load transaction failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// `place` or `radius` was absent or empty.
    #[error("incorrect query, you need to submit place and radius as URL parameters")]
    MissingParameter,

    /// `radius` did not parse as a non-negative float.
    #[error("radius is not a valid float")]
    InvalidRadius(String),

    /// No place with that name is in the catalog.
    #[error("place not found: {0}")]
    NotFound(String),

    /// A place with the same name is already stored.
    #[error("constraint violation: place {0:?} already exists")]
    Constraint(String),

    /// Query preparation or execution failed inside the storage engine.
    #[error("storage error: {0}")]
    Storage(String),
}

impl PopDbError {
    /// HTTP status the query interface answers with for this error.
    ///
    /// Client input problems (including an unknown place) are 400, anything
    /// the storage layer or the loader produced is 500.
    pub fn http_status(&self) -> u16 {
        match self {
            PopDbError::MissingParameter
            | PopDbError::InvalidRadius(_)
            | PopDbError::NotFound(_) => 400,
            _ => 500,
        }
    }

    /// `true` for errors caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

/// Why a single dump row was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowErrorKind {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("empty place name")]
    EmptyName,
    #[error("{field} is not a valid {expected}: {value:?}")]
    Unparseable {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("line is not valid UTF-8 or could not be read: {0}")]
    Unreadable(String),
}

/// A rejected dump row: where it was and what was wrong with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the dump.
    pub line: u64,
    pub kind: RowErrorKind,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for RowError {}
