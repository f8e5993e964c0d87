//! Error type for `xone-store-sqlite`.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;
use xone_core::user::CreateUserData;

#[derive(Debug, Error)]
pub enum Error {
  /// Domain-level failures: existing user, missing person or membership.
  #[error(transparent)]
  Core(#[from] xone_core::Error),

  /// The database thread could not be reached or the connection is closed.
  #[error("{op}: connection error: {source}")]
  Connection {
    op:     &'static str,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("{op}: database error: {source}")]
  Sqlite {
    op:     &'static str,
    #[source]
    source: rusqlite::Error,
  },

  /// A UNIQUE, NOT NULL or FOREIGN KEY constraint rejected the statement.
  #[error("{op}: constraint violation: {source}")]
  ConstraintViolation {
    op:     &'static str,
    #[source]
    source: rusqlite::Error,
  },

  /// The context was cancelled or its deadline passed.
  #[error("{op}: interrupted")]
  Interrupted { op: &'static str },

  #[error("migration {name:?} failed: {source}")]
  Migration {
    name:   &'static str,
    #[source]
    source: rusqlite::Error,
  },

  /// A stored date column holds something other than `YYYY-MM-DD` or `''`.
  #[error("{op}: malformed date {value:?} in storage: {source}")]
  DateParse {
    op:     &'static str,
    value:  String,
    #[source]
    source: chrono::ParseError,
  },

  #[error("cannot create database directory {path:?}: {source}")]
  CreateDir {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Wrap a SQLite error raised by operation `op`, classifying constraint
  /// violations and interrupts.
  pub(crate) fn sqlite(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
    move |source| match source.sqlite_error_code() {
      Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation { op, source },
      Some(ErrorCode::OperationInterrupted) => Self::Interrupted { op },
      _ => Self::Sqlite { op, source },
    }
  }

  /// Wrap a failure to reach the database thread during operation `op`.
  pub(crate) fn connection(op: &'static str) -> impl FnOnce(tokio_rusqlite::Error) -> Self {
    move |source| Self::Connection { op, source }
  }

  pub fn is_constraint_violation(&self) -> bool {
    matches!(self, Self::ConstraintViolation { .. })
  }

  /// `true` for updates that matched no row.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::Core(xone_core::Error::PersonNotFound(_) | xone_core::Error::MembershipNotFound(_))
    )
  }

  /// The rejected input if this is a duplicate-user failure.
  pub fn user_exists(&self) -> Option<&CreateUserData> {
    match self {
      Self::Core(xone_core::Error::UserExists(data)) => Some(data),
      _ => None,
    }
  }
}
