//! Error types for `xone-core`.

use thiserror::Error;

use crate::user::CreateUserData;

#[derive(Debug, Error)]
pub enum Error {
  /// A user with the same email is already registered. Carries the rejected
  /// input so callers can report or retry with it.
  #[error("user with email {:?} already exists", .0.email)]
  UserExists(CreateUserData),

  #[error("person not found: {0}")]
  PersonNotFound(String),

  #[error("membership not found: {0}")]
  MembershipNotFound(i64),

  #[error("invalid date {value:?}: {source}")]
  InvalidDate {
    value:  String,
    #[source]
    source: chrono::ParseError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
