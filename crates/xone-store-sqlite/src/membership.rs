//! [`MembershipStore`] — the membership-type catalog and per-person
//! membership records.

use rusqlite::{Connection, OptionalExtension as _};
use xone_core::{
  Context,
  membership::{CreateMembershipData, Membership, MembershipType, UpdateMembershipData},
};

use crate::{
  Error, Result, SqliteStore,
  encode::{MEMBERSHIP_COLUMNS, RawMembership, encode_date},
};

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MembershipStore {
  store: SqliteStore,
}

impl MembershipStore {
  pub fn new(store: SqliteStore) -> Self { Self { store } }

  /// The whole membership-type catalog, ordered by id.
  pub async fn find_all_membership_types(&self, ctx: &Context) -> Result<Vec<MembershipType>> {
    self
      .store
      .transaction(ctx, "membership_type.find_all", |tx| tx.find_all_membership_types())
      .await
  }

  /// Add a catalog entry. A duplicate name is a constraint violation.
  pub async fn create_membership_type(&self, ctx: &Context, name: &str) -> Result<MembershipType> {
    let name = name.to_owned();
    self
      .store
      .write_transaction(ctx, "membership_type.create", move |tx| tx.create_membership_type(&name))
      .await
  }

  /// Every membership of every person, ordered by id.
  pub async fn find_all_memberships(&self, ctx: &Context) -> Result<Vec<Membership>> {
    self
      .store
      .transaction(ctx, "membership.find_all", |tx| tx.find_all_memberships())
      .await
  }

  /// Memberships of the person with `public_id`, ordered by id. Unknown
  /// persons have none.
  pub async fn find_memberships_by_person(
    &self,
    ctx: &Context,
    public_id: &str,
  ) -> Result<Vec<Membership>> {
    let public_id = public_id.to_owned();
    self
      .store
      .transaction(ctx, "membership.find_by_person", move |tx| {
        tx.find_memberships_by_person(&public_id)
      })
      .await
  }

  pub async fn find_membership(&self, ctx: &Context, id: i64) -> Result<Option<Membership>> {
    self
      .store
      .transaction(ctx, "membership.find", move |tx| tx.find_membership(id))
      .await
  }

  /// Create a membership and return it as stored, type resolved. Unknown
  /// person or type ids are constraint violations.
  pub async fn create_membership(
    &self,
    ctx: &Context,
    data: CreateMembershipData,
  ) -> Result<Membership> {
    self
      .store
      .write_transaction(ctx, "membership.create", move |tx| tx.create_membership(&data))
      .await
  }

  /// Overwrite type and effective date of membership `id`. Fails with a
  /// not-found error unless exactly one row changed.
  pub async fn update_membership(
    &self,
    ctx: &Context,
    id: i64,
    data: UpdateMembershipData,
  ) -> Result<()> {
    self
      .store
      .write_transaction(ctx, "membership.update", move |tx| tx.update_membership(id, &data))
      .await
  }
}

// ─── SQL ─────────────────────────────────────────────────────────────────────

pub(crate) fn find_all_types(conn: &Connection) -> Result<Vec<MembershipType>> {
  let op = "membership_type.find_all";
  let mut stmt = conn
    .prepare("SELECT id, name FROM membership_type ORDER BY id")
    .map_err(Error::sqlite(op))?;
  let types = stmt
    .query_map([], |row| Ok(MembershipType { id: row.get(0)?, name: row.get(1)? }))
    .map_err(Error::sqlite(op))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(Error::sqlite(op))?;
  Ok(types)
}

pub(crate) fn create_type(conn: &Connection, name: &str) -> Result<MembershipType> {
  conn
    .execute("INSERT INTO membership_type (name) VALUES (?1)", rusqlite::params![name])
    .map_err(Error::sqlite("membership_type.create"))?;
  Ok(MembershipType { id: conn.last_insert_rowid(), name: name.to_owned() })
}

pub(crate) fn find_all(conn: &Connection) -> Result<Vec<Membership>> {
  let sql = format!(
    "SELECT {MEMBERSHIP_COLUMNS}
     FROM membership m
     JOIN membership_type t ON t.id = m.type_id
     ORDER BY m.id"
  );
  query_memberships(conn, "membership.find_all", &sql, [])
}

pub(crate) fn find_by_person(conn: &Connection, public_id: &str) -> Result<Vec<Membership>> {
  let sql = format!(
    "SELECT {MEMBERSHIP_COLUMNS}
     FROM membership m
     JOIN membership_type t ON t.id = m.type_id
     JOIN person p          ON p.id = m.person_id
     WHERE p.public_id = ?1
     ORDER BY m.id"
  );
  query_memberships(conn, "membership.find_by_person", &sql, rusqlite::params![public_id])
}

fn query_memberships(
  conn:   &Connection,
  op:     &'static str,
  sql:    &str,
  params: impl rusqlite::Params,
) -> Result<Vec<Membership>> {
  let mut stmt = conn.prepare(sql).map_err(Error::sqlite(op))?;
  let raws = stmt
    .query_map(params, |row| RawMembership::from_row(row, 0))
    .map_err(Error::sqlite(op))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(Error::sqlite(op))?;

  raws.into_iter().map(|raw| raw.into_membership(op)).collect()
}

pub(crate) fn find(conn: &Connection, id: i64) -> Result<Option<Membership>> {
  let op = "membership.find";
  let sql = format!(
    "SELECT {MEMBERSHIP_COLUMNS}
     FROM membership m
     JOIN membership_type t ON t.id = m.type_id
     WHERE m.id = ?1"
  );
  let raw = conn
    .query_row(&sql, rusqlite::params![id], |row| RawMembership::from_row(row, 0))
    .optional()
    .map_err(Error::sqlite(op))?;

  raw.map(|raw| raw.into_membership(op)).transpose()
}

pub(crate) fn create(conn: &Connection, data: &CreateMembershipData) -> Result<Membership> {
  conn
    .execute(
      "INSERT INTO membership (person_id, type_id, effective_from) VALUES (?1, ?2, ?3)",
      rusqlite::params![
        data.person_id,
        data.membership_type_id,
        encode_date(data.effective_from),
      ],
    )
    .map_err(Error::sqlite("membership.create"))?;

  let id = conn.last_insert_rowid();
  find(conn, id)?.ok_or_else(|| xone_core::Error::MembershipNotFound(id).into())
}

pub(crate) fn update(conn: &Connection, id: i64, data: &UpdateMembershipData) -> Result<()> {
  let changed = conn
    .execute(
      "UPDATE membership SET type_id = ?1, effective_from = ?2 WHERE id = ?3",
      rusqlite::params![data.membership_type_id, encode_date(data.effective_from), id],
    )
    .map_err(Error::sqlite("membership.update"))?;

  if changed != 1 {
    return Err(xone_core::Error::MembershipNotFound(id).into());
  }
  Ok(())
}
