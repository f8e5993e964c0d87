//! [`PersonStore`] and the SQL behind person aggregates.
//!
//! A person aggregate is rebuilt from one `LEFT JOIN` over `person`,
//! `membership` and `membership_type`, ordered by person id and then
//! membership id, and folded row by row.

use rusqlite::Connection;
use tracing::debug;
use xone_core::{
  Context,
  membership::CreateMembershipData,
  person::{CreatePersonData, IdGenerator, Person, UpdatePersonData, uuid_generator},
  store::PersonRepository,
};

use crate::{
  Error, Result, SqliteStore,
  encode::{MEMBERSHIP_COLUMNS, PERSON_COLUMN_COUNT, PERSON_COLUMNS, RawMembership, RawPerson, encode_date},
  membership,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Person records backed by [`SqliteStore`]. Each call runs in its own
/// transaction.
#[derive(Clone)]
pub struct PersonStore {
  store:       SqliteStore,
  generate_id: IdGenerator,
}

impl PersonStore {
  pub fn new(store: SqliteStore) -> Self { Self { store, generate_id: uuid_generator() } }

  /// Replace the public identifier generator, e.g. with
  /// [`xone_core::person::fixed_generator`] in tests.
  pub fn with_id_generator(mut self, generate_id: IdGenerator) -> Self {
    self.generate_id = generate_id;
    self
  }

  /// Overwrite the personal data of an existing person. Memberships are left
  /// untouched. Fails with a not-found error if no person matches.
  pub async fn update(&self, ctx: &Context, public_id: &str, data: UpdatePersonData) -> Result<()> {
    let public_id = public_id.to_owned();
    self
      .store
      .write_transaction(ctx, "person.update", move |tx| tx.update_person(&public_id, &data))
      .await
  }
}

impl PersonRepository for PersonStore {
  type Error = Error;

  async fn find_all(&self, ctx: &Context) -> Result<Vec<Person>> {
    self
      .store
      .transaction(ctx, "person.find_all", |tx| tx.find_all_persons())
      .await
  }

  async fn find(&self, ctx: &Context, public_id: &str) -> Result<Option<Person>> {
    let public_id = public_id.to_owned();
    self
      .store
      .transaction(ctx, "person.find", move |tx| tx.find_person(&public_id))
      .await
  }

  async fn create(&self, ctx: &Context, data: CreatePersonData) -> Result<Person> {
    let public_id = (self.generate_id)();
    self
      .store
      .write_transaction(ctx, "person.create", move |tx| tx.create_person(&public_id, &data))
      .await
  }

  async fn delete(&self, ctx: &Context, public_id: &str) -> Result<()> {
    let public_id = public_id.to_owned();
    self
      .store
      .write_transaction(ctx, "person.delete", move |tx| tx.delete_person(&public_id))
      .await
  }
}

// ─── SQL ─────────────────────────────────────────────────────────────────────

pub(crate) fn find_all(conn: &Connection) -> Result<Vec<Person>> {
  let sql = format!(
    "SELECT {PERSON_COLUMNS}, {MEMBERSHIP_COLUMNS}
     FROM person p
     LEFT JOIN membership m      ON m.person_id = p.id
     LEFT JOIN membership_type t ON t.id = m.type_id
     ORDER BY p.id, m.id"
  );
  query_aggregates(conn, "person.find_all", &sql, [])
}

pub(crate) fn find(conn: &Connection, public_id: &str) -> Result<Option<Person>> {
  let sql = format!(
    "SELECT {PERSON_COLUMNS}, {MEMBERSHIP_COLUMNS}
     FROM person p
     LEFT JOIN membership m      ON m.person_id = p.id
     LEFT JOIN membership_type t ON t.id = m.type_id
     WHERE p.public_id = ?1
     ORDER BY p.id, m.id"
  );
  let persons = query_aggregates(conn, "person.find", &sql, rusqlite::params![public_id])?;
  Ok(persons.into_iter().next())
}

/// Run an aggregate query and fold its rows: consecutive rows with the same
/// person id contribute one membership each.
fn query_aggregates(
  conn:   &Connection,
  op:     &'static str,
  sql:    &str,
  params: impl rusqlite::Params,
) -> Result<Vec<Person>> {
  let mut stmt = conn.prepare(sql).map_err(Error::sqlite(op))?;
  let rows = stmt
    .query_map(params, |row| {
      let person = RawPerson::from_row(row)?;
      let membership = match row.get::<_, Option<i64>>(PERSON_COLUMN_COUNT)? {
        Some(_) => Some(RawMembership::from_row(row, PERSON_COLUMN_COUNT)?),
        None => None,
      };
      Ok((person, membership))
    })
    .map_err(Error::sqlite(op))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(Error::sqlite(op))?;

  let mut persons: Vec<Person> = Vec::new();
  for (raw_person, raw_membership) in rows {
    let same_person = persons.last().is_some_and(|p| p.id == raw_person.id);
    if !same_person {
      persons.push(raw_person.into_person(op)?);
    }
    if let (Some(raw), Some(person)) = (raw_membership, persons.last_mut()) {
      person.memberships.push(raw.into_membership(op)?);
    }
  }
  Ok(persons)
}

pub(crate) fn create(conn: &Connection, public_id: &str, data: &CreatePersonData) -> Result<Person> {
  let op = "person.create";
  conn
    .execute(
      "INSERT INTO person (
         public_id, first_name, last_name, date_of_birth, email, phone, mobile,
         street, house_number, zip_code, city
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
      rusqlite::params![
        public_id,
        data.first_name,
        data.last_name,
        encode_date(data.date_of_birth),
        data.email,
        data.phone,
        data.mobile,
        data.street,
        data.house_number,
        data.zip_code,
        data.city,
      ],
    )
    .map_err(Error::sqlite(op))?;
  let id = conn.last_insert_rowid();

  if let Some(initial) = &data.membership {
    membership::create(conn, &CreateMembershipData {
      person_id:          id,
      membership_type_id: initial.membership_type_id,
      effective_from:     initial.effective_from,
    })?;
  }

  Ok(Person {
    id,
    public_id: public_id.to_owned(),
    first_name: data.first_name.clone(),
    last_name: data.last_name.clone(),
    date_of_birth: data.date_of_birth,
    email: data.email.clone(),
    phone: data.phone.clone(),
    mobile: data.mobile.clone(),
    street: data.street.clone(),
    house_number: data.house_number.clone(),
    zip_code: data.zip_code.clone(),
    city: data.city.clone(),
    memberships: membership::find_by_person(conn, public_id)?,
  })
}

pub(crate) fn update(conn: &Connection, public_id: &str, data: &UpdatePersonData) -> Result<()> {
  let changed = conn
    .execute(
      "UPDATE person SET
         first_name = ?1, last_name = ?2, date_of_birth = ?3,
         email = ?4, phone = ?5, mobile = ?6,
         street = ?7, house_number = ?8, zip_code = ?9, city = ?10
       WHERE public_id = ?11",
      rusqlite::params![
        data.first_name,
        data.last_name,
        encode_date(data.date_of_birth),
        data.email,
        data.phone,
        data.mobile,
        data.street,
        data.house_number,
        data.zip_code,
        data.city,
        public_id,
      ],
    )
    .map_err(Error::sqlite("person.update"))?;

  if changed != 1 {
    return Err(xone_core::Error::PersonNotFound(public_id.to_owned()).into());
  }
  Ok(())
}

/// Delete a person and, by cascade, its memberships. Deleting an unknown
/// public id succeeds.
pub(crate) fn delete(conn: &Connection, public_id: &str) -> Result<()> {
  let deleted = conn
    .execute("DELETE FROM person WHERE public_id = ?1", rusqlite::params![public_id])
    .map_err(Error::sqlite("person.delete"))?;
  if deleted == 0 {
    debug!(public_id, "delete matched no person");
  }
  Ok(())
}
