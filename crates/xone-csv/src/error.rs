//! Error types for the xone CSV codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("line {line}: expected at least 3 columns, found {found}")]
  MissingColumns { line: u64, found: usize },

  #[error("line {line}: {value:?} is not a valid date of birth")]
  InvalidDate { line: u64, value: String },

  /// Flat files hold personal data only.
  #[error("memberships cannot be stored in a csv file")]
  MembershipsUnsupported,

  #[error("operation cancelled")]
  Cancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
