//! Classification of SQLite and pool errors into [`StoreError`]

use agent_tools_application::StoreError;
use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

/// A persisted value that does not decode into its domain type
#[derive(Error, Debug)]
#[error("{column}: {reason}")]
pub(crate) struct DecodeError {
    pub column: &'static str,
    pub reason: String,
}

impl DecodeError {
    /// Wrap as the rusqlite conversion error expected inside row mappers
    pub(crate) fn into_sqlite(self, idx: usize) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(self),
        )
    }
}

/// Map a rusqlite error to the port's error type
pub(crate) fn classify(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            let detail = message.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    StoreError::UniqueViolation(detail)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreError::ForeignKeyViolation(detail),
                _ if failure.code == ErrorCode::OperationInterrupted => StoreError::Cancelled,
                _ if failure.code == ErrorCode::NotADatabase
                    || failure.code == ErrorCode::DatabaseCorrupt =>
                {
                    StoreError::Corrupt(detail)
                }
                _ => StoreError::Database(detail),
            }
        }
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..)
        | rusqlite::Error::InvalidColumnType(..) => StoreError::Corrupt(err.to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}

pub(crate) fn pool_error(err: r2d2::Error) -> StoreError {
    StoreError::Connection(err.to_string())
}

pub(crate) fn json_error(err: serde_json::Error) -> StoreError {
    StoreError::Serialization(err.to_string())
}
