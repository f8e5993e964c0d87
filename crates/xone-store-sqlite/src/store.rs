//! [`SqliteStore`] — connection and transaction management.

use std::{panic::AssertUnwindSafe, path::Path};

use rusqlite::{Connection, TransactionBehavior};
use tracing::debug;
use xone_core::{
  Context,
  membership::{
    CreateMembershipData, Membership, MembershipType, UpdateMembershipData,
  },
  person::{CreatePersonData, Person, UpdatePersonData},
  user::{CreateUserData, User},
};

use crate::{
  Error, Result,
  membership::{self, MembershipStore},
  migrate,
  person::{self, PersonStore},
  user::{self, UserStore},
};

/// How many SQLite VM instructions run between cancellation checks.
const PROGRESS_INTERVAL: i32 = 1000;

// ─── Store ───────────────────────────────────────────────────────────────────

/// The registry database: a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and all
/// statements run on one dedicated database thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database at `path`, enable foreign keys and WAL
  /// journaling, and apply pending migrations.
  ///
  /// Missing parent directories are created.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| Error::CreateDir { path: dir.to_path_buf(), source })?;
    }

    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::connection("open"))?;
    Self::init(conn).await
  }

  /// Open an in-memory database, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::connection("open"))?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let applied = conn
      .call(|conn| Ok(configure(conn).and_then(|()| migrate::apply(conn))))
      .await
      .map_err(Error::connection("open"))??;
    debug!(applied, "database ready");
    Ok(Self { conn })
  }

  /// Close the connection. Closing an already closed store is a no-op.
  pub async fn close(&self) -> Result<()> {
    match self.conn.clone().close().await {
      Ok(()) | Err(tokio_rusqlite::Error::ConnectionClosed) => Ok(()),
      Err(e) => Err(Error::connection("close")(e)),
    }
  }

  /// Run `f` inside one transaction.
  ///
  /// `Ok` commits, `Err` rolls back. Statements are interrupted once `ctx`
  /// is cancelled or past its deadline, which also rolls back.
  pub async fn transaction<T, F>(&self, ctx: &Context, op: &'static str, f: F) -> Result<T>
  where
    F: FnOnce(&Tx<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.run(ctx, op, TransactionBehavior::Deferred, f).await
  }

  /// Like [`transaction`](Self::transaction), but takes the write lock when
  /// the transaction begins. A concurrent writer waits for the busy timeout
  /// and then sees this transaction's effects, so check-then-insert sequences
  /// stay consistent across processes.
  pub async fn write_transaction<T, F>(&self, ctx: &Context, op: &'static str, f: F) -> Result<T>
  where
    F: FnOnce(&Tx<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.run(ctx, op, TransactionBehavior::Immediate, f).await
  }

  async fn run<T, F>(
    &self,
    ctx: &Context,
    op: &'static str,
    behavior: TransactionBehavior,
    f: F,
  ) -> Result<T>
  where
    F: FnOnce(&Tx<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    if ctx.is_done() {
      return Err(Error::Interrupted { op });
    }

    let ctx = ctx.clone();
    let result = self
      .conn
      .call(move |conn| Ok(run_in_transaction(conn, ctx, op, behavior, f)))
      .await
      .map_err(Error::connection(op))?;

    if let Err(e) = &result {
      debug!(op, error = %e, "transaction rolled back");
    }
    result
  }

  /// Names of the migrations recorded in the catalog.
  pub async fn applied_migrations(&self) -> Result<Vec<String>> {
    self
      .conn
      .call(|conn| Ok(migrate::applied_migrations(conn)))
      .await
      .map_err(Error::connection("migrations.list"))?
  }

  pub fn persons(&self) -> PersonStore { PersonStore::new(self.clone()) }

  pub fn memberships(&self) -> MembershipStore { MembershipStore::new(self.clone()) }

  pub fn users(&self) -> UserStore { UserStore::new(self.clone()) }
}

fn configure(conn: &Connection) -> Result<()> {
  conn
    .pragma_update(None, "foreign_keys", true)
    .map_err(Error::sqlite("pragma foreign_keys"))?;

  let mode: String = conn
    .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
    .map_err(Error::sqlite("pragma journal_mode"))?;
  debug!(journal_mode = %mode, "configured connection");
  Ok(())
}

fn run_in_transaction<T, F>(
  conn: &mut Connection,
  ctx: Context,
  op: &'static str,
  behavior: TransactionBehavior,
  f: F,
) -> Result<T>
where
  F: FnOnce(&Tx<'_>) -> Result<T>,
{
  let ctx = AssertUnwindSafe(ctx);
  conn.progress_handler(PROGRESS_INTERVAL, Some(move || context_done(&ctx)));

  let result = transact(conn, op, behavior, f);

  conn.progress_handler(PROGRESS_INTERVAL, None::<fn() -> bool>);
  result
}

fn context_done(ctx: &AssertUnwindSafe<Context>) -> bool { ctx.is_done() }

fn transact<T, F>(
  conn: &mut Connection,
  op: &'static str,
  behavior: TransactionBehavior,
  f: F,
) -> Result<T>
where
  F: FnOnce(&Tx<'_>) -> Result<T>,
{
  let tx = Tx(
    conn
      .transaction_with_behavior(behavior)
      .map_err(Error::sqlite(op))?,
  );
  let value = f(&tx)?;
  tx.0.commit().map_err(Error::sqlite(op))?;
  Ok(value)
}

// ─── Transaction handle ──────────────────────────────────────────────────────

/// An open transaction, handed to the closure given to
/// [`SqliteStore::transaction`].
///
/// Every store operation is available here so several of them can be
/// composed atomically.
pub struct Tx<'c>(rusqlite::Transaction<'c>);

impl Tx<'_> {
  // ── Persons ───────────────────────────────────────────────────────────────

  pub fn find_all_persons(&self) -> Result<Vec<Person>> { person::find_all(&self.0) }

  pub fn find_person(&self, public_id: &str) -> Result<Option<Person>> {
    person::find(&self.0, public_id)
  }

  pub fn create_person(&self, public_id: &str, data: &CreatePersonData) -> Result<Person> {
    person::create(&self.0, public_id, data)
  }

  pub fn update_person(&self, public_id: &str, data: &UpdatePersonData) -> Result<()> {
    person::update(&self.0, public_id, data)
  }

  pub fn delete_person(&self, public_id: &str) -> Result<()> {
    person::delete(&self.0, public_id)
  }

  // ── Memberships ───────────────────────────────────────────────────────────

  pub fn find_all_membership_types(&self) -> Result<Vec<MembershipType>> {
    membership::find_all_types(&self.0)
  }

  pub fn create_membership_type(&self, name: &str) -> Result<MembershipType> {
    membership::create_type(&self.0, name)
  }

  pub fn find_all_memberships(&self) -> Result<Vec<Membership>> { membership::find_all(&self.0) }

  pub fn find_memberships_by_person(&self, public_id: &str) -> Result<Vec<Membership>> {
    membership::find_by_person(&self.0, public_id)
  }

  pub fn find_membership(&self, id: i64) -> Result<Option<Membership>> {
    membership::find(&self.0, id)
  }

  pub fn create_membership(&self, data: &CreateMembershipData) -> Result<Membership> {
    membership::create(&self.0, data)
  }

  pub fn update_membership(&self, id: i64, data: &UpdateMembershipData) -> Result<()> {
    membership::update(&self.0, id, data)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    user::find_by_email(&self.0, email)
  }

  pub fn create_user(&self, data: CreateUserData) -> Result<User> { user::create(&self.0, data) }
}
