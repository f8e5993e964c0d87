//! [`CsvPersonStore`]: an in-memory person collection backed by a CSV file.

use std::{
  path::Path,
  sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::debug;
use xone_core::{
  Context,
  person::{CreatePersonData, IdGenerator, Person, uuid_generator},
  store::PersonRepository,
};

use crate::{Error, Result};

struct Inner {
  persons: Vec<Person>,
  next_id: i64,
}

/// Persons loaded from (and saved to) a flat file.
///
/// Records get sequential internal ids and generated public ids when they are
/// loaded; neither is written back, since the file format has no columns for
/// them.
pub struct CsvPersonStore {
  inner:       Mutex<Inner>,
  generate_id: IdGenerator,
}

impl Default for CsvPersonStore {
  fn default() -> Self { Self::new() }
}

impl CsvPersonStore {
  pub fn new() -> Self {
    Self {
      inner:       Mutex::new(Inner { persons: Vec::new(), next_id: 1 }),
      generate_id: uuid_generator(),
    }
  }

  pub fn with_id_generator(mut self, generate_id: IdGenerator) -> Self {
    self.generate_id = generate_id;
    self
  }

  /// Load every record of the CSV file at `path`.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let store = Self::new();
    store.extend(crate::read_file(path)?);
    Ok(store)
  }

  /// Add `persons`, assigning internal ids and missing public ids.
  pub fn extend(&self, persons: impl IntoIterator<Item = Person>) {
    let mut inner = self.lock();
    for mut person in persons {
      person.id = inner.next_id;
      inner.next_id += 1;
      if person.public_id.is_empty() {
        person.public_id = (self.generate_id)();
      }
      inner.persons.push(person);
    }
  }

  /// Write the current collection to `path`.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let persons = self.lock().persons.clone();
    crate::write_file(path, &persons)
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn check(ctx: &Context) -> Result<()> {
  if ctx.is_done() {
    return Err(Error::Cancelled);
  }
  Ok(())
}

impl PersonRepository for CsvPersonStore {
  type Error = Error;

  async fn find_all(&self, ctx: &Context) -> Result<Vec<Person>> {
    check(ctx)?;
    Ok(self.lock().persons.clone())
  }

  async fn find(&self, ctx: &Context, public_id: &str) -> Result<Option<Person>> {
    check(ctx)?;
    Ok(
      self
        .lock()
        .persons
        .iter()
        .find(|p| p.public_id == public_id)
        .cloned(),
    )
  }

  async fn create(&self, ctx: &Context, data: CreatePersonData) -> Result<Person> {
    check(ctx)?;
    if data.membership.is_some() {
      return Err(Error::MembershipsUnsupported);
    }

    let mut inner = self.lock();
    let person = Person {
      id:            inner.next_id,
      public_id:     (self.generate_id)(),
      first_name:    data.first_name,
      last_name:     data.last_name,
      date_of_birth: data.date_of_birth,
      email:         data.email,
      phone:         data.phone,
      mobile:        data.mobile,
      street:        data.street,
      house_number:  data.house_number,
      zip_code:      data.zip_code,
      city:          data.city,
      memberships:   Vec::new(),
    };
    inner.next_id += 1;
    inner.persons.push(person.clone());
    Ok(person)
  }

  async fn delete(&self, ctx: &Context, public_id: &str) -> Result<()> {
    check(ctx)?;
    let mut inner = self.lock();
    let before = inner.persons.len();
    inner.persons.retain(|p| p.public_id != public_id);
    if inner.persons.len() == before {
      debug!(public_id, "delete matched no person");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use xone_core::person::{InitialMembership, fixed_generator};

  use super::*;

  fn ctx() -> Context { Context::background() }

  #[tokio::test]
  async fn create_find_delete() {
    let store = CsvPersonStore::new().with_id_generator(fixed_generator("id"));
    let created = store
      .create(&ctx(), CreatePersonData {
        first_name: "Harry".into(),
        last_name: "Potter".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1980, 7, 31),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.public_id, "id");

    assert_eq!(store.find(&ctx(), "id").await.unwrap(), Some(created));

    store.delete(&ctx(), "id").await.unwrap();
    assert!(store.find(&ctx(), "id").await.unwrap().is_none());
    store.delete(&ctx(), "id").await.unwrap();
  }

  #[tokio::test]
  async fn empty_store_finds_nothing() {
    let store = CsvPersonStore::new();
    assert!(store.find_all(&ctx()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn memberships_are_rejected() {
    let store = CsvPersonStore::new();
    let err = store
      .create(&ctx(), CreatePersonData {
        membership: Some(InitialMembership { membership_type_id: 1, effective_from: None }),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::MembershipsUnsupported));
  }

  #[tokio::test]
  async fn cancelled_context_is_rejected() {
    let store = CsvPersonStore::new();
    let cancelled = ctx().child();
    cancelled.cancel();
    assert!(matches!(store.find_all(&cancelled).await, Err(Error::Cancelled)));
  }

  #[tokio::test]
  async fn open_and_save_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("members.csv");
    std::fs::write(&path, "Harry,Potter,1980-07-31\nRon,Weasley,1980-03-01,m\n").unwrap();

    let store = CsvPersonStore::open(&path).unwrap();
    let all = store.find_all(&ctx()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), [1, 2]);
    assert!(all.iter().all(|p| !p.public_id.is_empty()));

    store.delete(&ctx(), &all[0].public_id).await.unwrap();
    store.save(&path).unwrap();
    assert_eq!(
      std::fs::read_to_string(&path).unwrap(),
      "Ron,Weasley,1980-03-01\n"
    );
  }
}
