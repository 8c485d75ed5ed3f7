//! Store error taxonomy and storage-error translation.
//!
//! # Responsibility
//! - Define the typed errors every store operation returns.
//! - Translate raw SQLite failures into the taxonomy at the repository
//!   boundary instead of leaking driver errors.
//!
//! # Invariants
//! - `NotFound`, `Invalid` are raised before any write is attempted.
//! - `Conflict` means a compare-and-swap matched zero rows.
//! - `AlreadyExists` is only produced from unique / primary-key violations.

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Namespace segment, entity or version absent among live rows.
    NotFound { resource: &'static str, name: String },
    /// Optimistic update lost against a concurrent writer.
    Conflict { resource: &'static str, name: String },
    /// Unique constraint violation on a non-overwrite insert or rename.
    AlreadyExists { resource: &'static str, name: String },
    /// Malformed input or identity tampering by a mutation.
    Invalid(String),
    /// Any other storage failure.
    Persistence(DbError),
}

impl StoreError {
    pub fn not_found(resource: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            name: name.into(),
        }
    }

    pub fn conflict(resource: &'static str, name: impl Into<String>) -> Self {
        Self::Conflict {
            resource,
            name: name.into(),
        }
    }

    pub fn already_exists(resource: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource,
            name: name.into(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Persistence(DbError::CorruptData(message.into()))
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Invalid(_) => "invalid",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { resource, name } => write!(f, "{resource} not found: {name}"),
            Self::Conflict { resource, name } => write!(
                f,
                "{resource} was concurrently modified or deleted: {name}"
            ),
            Self::AlreadyExists { resource, name } => {
                write!(f, "{resource} already exists: {name}")
            }
            Self::Invalid(message) => write!(f, "invalid request: {message}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

/// Returns whether `err` is a unique or primary-key constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

/// Translates an insert/rename failure: unique violations become
/// `AlreadyExists`, everything else stays a persistence error.
pub(crate) fn translate_write_error(
    err: rusqlite::Error,
    resource: &'static str,
    name: &str,
) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::already_exists(resource, name)
    } else {
        StoreError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_unique_violation, translate_write_error, StoreError};
    use rusqlite::Connection;

    fn unique_failure() -> rusqlite::Error {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT PRIMARY KEY); INSERT INTO t VALUES ('a');")
            .unwrap();
        conn.execute("INSERT INTO t VALUES ('a');", []).unwrap_err()
    }

    #[test]
    fn primary_key_violation_maps_to_already_exists() {
        let err = unique_failure();
        assert!(is_unique_violation(&err));

        let translated = translate_write_error(err, "metric", "m.c.s.REVENUE");
        assert!(matches!(
            translated,
            StoreError::AlreadyExists { resource: "metric", .. }
        ));
    }

    #[test]
    fn check_violation_is_not_treated_as_duplicate() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER CHECK (v > 0));")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES (0);", []).unwrap_err();

        assert!(!is_unique_violation(&err));
        let translated = translate_write_error(err, "metric", "x");
        assert_eq!(translated.code(), "persistence");
    }
}
