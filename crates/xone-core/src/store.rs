//! Repository traits implemented by storage backends.
//!
//! `xone-store-sqlite` implements both traits on top of SQLite; `xone-csv`
//! implements [`PersonRepository`] over a flat file. Callers such as the CLI
//! depend on these abstractions rather than a concrete backend.

use std::future::Future;

use crate::{
  context::Context,
  person::{CreatePersonData, Person},
  user::{CreateUserData, User},
};

/// Read, create and delete person aggregates.
///
/// Lookups report a missing record as `Ok(None)`, never as an error.
pub trait PersonRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All persons with their memberships attached. An empty store yields an
  /// empty vector.
  fn find_all<'a>(
    &'a self,
    ctx: &'a Context,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;

  /// The person with the given public identifier, if any.
  fn find<'a>(
    &'a self,
    ctx: &'a Context,
    public_id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// Persist a new person under a freshly generated public identifier and
  /// return the complete aggregate.
  fn create<'a>(
    &'a self,
    ctx: &'a Context,
    data: CreatePersonData,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + 'a;

  /// Remove a person. Removing an unknown identifier is not an error.
  fn delete<'a>(
    &'a self,
    ctx: &'a Context,
    public_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Credential lookup and registration.
pub trait UserRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Exact-match lookup by email.
  fn find_by_email<'a>(
    &'a self,
    ctx: &'a Context,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Register a user. Fails with [`crate::Error::UserExists`] (possibly
  /// wrapped by the backend) if the email is taken.
  fn create<'a>(
    &'a self,
    ctx: &'a Context,
    data: CreateUserData,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;
}
