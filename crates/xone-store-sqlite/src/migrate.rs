//! Embedded, append-only schema migrations.
//!
//! Scripts are compiled into the binary and applied in name order. Each
//! script runs in its own transaction together with the catalog insert that
//! records it, so a failing script leaves no trace. Released scripts must
//! never be edited; schema changes go into a new, higher-numbered file.

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::{Error, Result};

/// A named schema-upgrade script.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
  pub name: &'static str,
  pub sql:  &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
  Migration {
    name: "0001_person.sql",
    sql:  include_str!("../migrations/0001_person.sql"),
  },
  Migration {
    name: "0002_users.sql",
    sql:  include_str!("../migrations/0002_users.sql"),
  },
  Migration {
    name: "0003_person_address.sql",
    sql:  include_str!("../migrations/0003_person_address.sql"),
  },
];

const CATALOG: &str = "CREATE TABLE IF NOT EXISTS migrations (name TEXT PRIMARY KEY);";

/// Bring the database up to date with [`MIGRATIONS`].
pub fn apply(conn: &mut Connection) -> Result<usize> { apply_all(conn, MIGRATIONS) }

/// Apply every migration in `migrations` that is not yet recorded, in name
/// order. Returns how many were applied.
pub(crate) fn apply_all(conn: &mut Connection, migrations: &[Migration]) -> Result<usize> {
  conn
    .execute_batch(CATALOG)
    .map_err(|source| Error::Migration { name: "migrations", source })?;

  let mut ordered: Vec<&Migration> = migrations.iter().collect();
  ordered.sort_by_key(|m| m.name);

  let mut applied = 0;
  for migration in ordered {
    if apply_one(conn, migration)? {
      applied += 1;
    }
  }
  Ok(applied)
}

fn apply_one(conn: &mut Connection, migration: &Migration) -> Result<bool> {
  let name = migration.name;
  let fail = |source: rusqlite::Error| Error::Migration { name, source };

  // Concurrent openers of the same file queue here, then see the record.
  let tx = conn
    .transaction_with_behavior(TransactionBehavior::Immediate)
    .map_err(fail)?;

  let recorded: i64 = tx
    .query_row(
      "SELECT COUNT(*) FROM migrations WHERE name = ?1",
      rusqlite::params![name],
      |row| row.get(0),
    )
    .map_err(fail)?;
  if recorded != 0 {
    debug!(migration = name, "migration already applied");
    return Ok(false);
  }

  tx.execute_batch(migration.sql).map_err(fail)?;
  tx
    .execute("INSERT INTO migrations (name) VALUES (?1)", rusqlite::params![name])
    .map_err(fail)?;
  tx.commit().map_err(fail)?;

  info!(migration = name, "applied migration");
  Ok(true)
}

/// Names recorded in the migration catalog, sorted.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
  let op = "migrations.list";
  let mut stmt = conn
    .prepare("SELECT name FROM migrations ORDER BY name")
    .map_err(Error::sqlite(op))?;
  let names = stmt
    .query_map([], |row| row.get(0))
    .map_err(Error::sqlite(op))?
    .collect::<rusqlite::Result<Vec<String>>>()
    .map_err(Error::sqlite(op))?;
  Ok(names)
}
