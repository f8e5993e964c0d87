//! [`UserStore`] — administrative credentials.

use rusqlite::{Connection, OptionalExtension as _};
use xone_core::{
  Context,
  store::UserRepository,
  user::{CreateUserData, User},
};

use crate::{Error, Result, SqliteStore};

#[derive(Clone)]
pub struct UserStore {
  store: SqliteStore,
}

impl UserStore {
  pub fn new(store: SqliteStore) -> Self { Self { store } }
}

impl UserRepository for UserStore {
  type Error = Error;

  async fn find_by_email(&self, ctx: &Context, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();
    self
      .store
      .transaction(ctx, "user.find_by_email", move |tx| tx.find_user_by_email(&email))
      .await
  }

  async fn create(&self, ctx: &Context, data: CreateUserData) -> Result<User> {
    self
      .store
      .write_transaction(ctx, "user.create", move |tx| tx.create_user(data))
      .await
  }
}

pub(crate) fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
  conn
    .query_row(
      "SELECT email, password FROM users WHERE email = ?1",
      rusqlite::params![email],
      |row| Ok(User { email: row.get(0)?, password: row.get(1)? }),
    )
    .optional()
    .map_err(Error::sqlite("user.find_by_email"))
}

/// Insert a user unless one with the same email exists. The check and the
/// insert share the caller's transaction.
pub(crate) fn create(conn: &Connection, data: CreateUserData) -> Result<User> {
  if find_by_email(conn, &data.email)?.is_some() {
    return Err(xone_core::Error::UserExists(data).into());
  }

  conn
    .execute(
      "INSERT INTO users (email, password) VALUES (?1, ?2)",
      rusqlite::params![data.email, data.password],
    )
    .map_err(Error::sqlite("user.create"))?;

  Ok(User::from(data))
}
