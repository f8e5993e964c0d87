//! Person — a member of the organization together with its membership
//! history.

use std::sync::Arc;

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::membership::Membership;

// ─── Identifier generation ───────────────────────────────────────────────────

/// Produces the public identifier of a newly created person.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// The default generator: a random, hyphenated UUID v4.
pub fn uuid_generator() -> IdGenerator {
  Arc::new(|| Uuid::new_v4().hyphenated().to_string())
}

/// A generator that always returns `id`. Intended for reproducible tests.
pub fn fixed_generator(id: impl Into<String>) -> IdGenerator {
  let id = id.into();
  Arc::new(move || id.clone())
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// A person aggregate: personal data plus memberships ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  /// Internal id, assigned by the store.
  pub id:            i64,
  /// Stable external identifier. Immutable once assigned.
  pub public_id:     String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: Option<NaiveDate>,
  pub email:         String,
  pub phone:         String,
  pub mobile:        String,
  pub street:        String,
  pub house_number:  String,
  pub zip_code:      String,
  pub city:          String,
  pub memberships:   Vec<Membership>,
}

impl Person {
  pub fn has_date_of_birth(&self) -> bool { self.date_of_birth.is_some() }

  /// Age in completed years on `today`. Zero when the date of birth is
  /// unknown or lies after `today`.
  pub fn age(&self, today: NaiveDate) -> u32 {
    let Some(dob) = self.date_of_birth else {
      return 0;
    };
    if today < dob {
      return 0;
    }

    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
      age -= 1;
    }
    age as u32
  }

  /// The membership in effect on `today`.
  ///
  /// Dated memberships after `today` never qualify. Among the rest, a later
  /// `effective_from` replaces an earlier one. An undated membership replaces
  /// whatever was selected before it in id order, so it wins over earlier
  /// dated entries and acts as the fallback when nothing dated qualifies.
  pub fn current_membership(&self, today: NaiveDate) -> Option<&Membership> {
    let mut current: Option<&Membership> = None;

    for membership in &self.memberships {
      let Some(from) = membership.effective_from else {
        current = Some(membership);
        continue;
      };
      if from > today {
        continue;
      }

      let replaces = match current.and_then(|c| c.effective_from) {
        Some(selected) => selected < from,
        None => true,
      };
      if replaces {
        current = Some(membership);
      }
    }

    current
  }

  /// The mutable fields of this person, as a starting point for an update.
  pub fn to_update_data(&self) -> UpdatePersonData {
    UpdatePersonData {
      first_name:    self.first_name.clone(),
      last_name:     self.last_name.clone(),
      date_of_birth: self.date_of_birth,
      email:         self.email.clone(),
      phone:         self.phone.clone(),
      mobile:        self.mobile.clone(),
      street:        self.street.clone(),
      house_number:  self.house_number.clone(),
      zip_code:      self.zip_code.clone(),
      city:          self.city.clone(),
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// A membership to create together with a new person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialMembership {
  pub membership_type_id: i64,
  pub effective_from:     Option<NaiveDate>,
}

/// Everything needed to create a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePersonData {
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: Option<NaiveDate>,
  pub email:         String,
  pub phone:         String,
  pub mobile:        String,
  pub street:        String,
  pub house_number:  String,
  pub zip_code:      String,
  pub city:          String,
  pub membership:    Option<InitialMembership>,
}

impl From<&Person> for CreatePersonData {
  /// Personal data of `person`, without memberships. Used when importing
  /// records read from another source.
  fn from(person: &Person) -> Self {
    Self {
      first_name:    person.first_name.clone(),
      last_name:     person.last_name.clone(),
      date_of_birth: person.date_of_birth,
      email:         person.email.clone(),
      phone:         person.phone.clone(),
      mobile:        person.mobile.clone(),
      street:        person.street.clone(),
      house_number:  person.house_number.clone(),
      zip_code:      person.zip_code.clone(),
      city:          person.city.clone(),
      membership:    None,
    }
  }
}

/// The fields of a person that can be overwritten in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePersonData {
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: Option<NaiveDate>,
  pub email:         String,
  pub phone:         String,
  pub mobile:        String,
  pub street:        String,
  pub house_number:  String,
  pub zip_code:      String,
  pub city:          String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::membership::MembershipType;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn born(dob: Option<NaiveDate>) -> Person {
    Person { date_of_birth: dob, ..Default::default() }
  }

  fn membership(id: i64, name: &str, from: Option<NaiveDate>) -> Membership {
    Membership {
      id,
      membership_type: MembershipType { id, name: name.into() },
      effective_from: from,
    }
  }

  fn with_memberships(memberships: Vec<Membership>) -> Person {
    Person { memberships, ..Default::default() }
  }

  // ─── Age ───────────────────────────────────────────────────────────────────

  #[test]
  fn age_before_date_of_birth_is_zero() {
    let p = born(Some(date(1980, 7, 31)));
    assert_eq!(p.age(date(1980, 7, 30)), 0);
  }

  #[test]
  fn age_on_birthday() {
    let p = born(Some(date(1980, 7, 31)));
    assert_eq!(p.age(date(2000, 7, 31)), 20);
  }

  #[test]
  fn age_day_after_birthday() {
    let p = born(Some(date(1980, 7, 31)));
    assert_eq!(p.age(date(2000, 8, 1)), 20);
  }

  #[test]
  fn age_day_before_birthday() {
    let p = born(Some(date(1980, 7, 31)));
    assert_eq!(p.age(date(2000, 7, 30)), 19);
  }

  #[test]
  fn age_without_date_of_birth_is_zero() {
    let p = born(None);
    assert!(!p.has_date_of_birth());
    assert_eq!(p.age(date(2022, 2, 23)), 0);
    assert_eq!(p.age(date(1900, 1, 1)), 0);
  }

  #[test]
  fn age_leap_day_birthday() {
    let p = born(Some(date(2000, 2, 29)));
    assert_eq!(p.age(date(2001, 2, 28)), 0);
    assert_eq!(p.age(date(2001, 3, 1)), 1);
    assert_eq!(p.age(date(2004, 2, 29)), 4);
  }

  // ─── Current membership ───────────────────────────────────────────────────

  #[test]
  fn no_memberships() {
    let p = with_memberships(vec![]);
    assert_eq!(p.current_membership(date(2022, 2, 23)), None);
  }

  #[test]
  fn single_undated_membership() {
    let p = with_memberships(vec![membership(1, "active", None)]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(1));
  }

  #[test]
  fn last_undated_membership_wins() {
    let p = with_memberships(vec![
      membership(1, "active", None),
      membership(2, "passive", None),
    ]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(2));
  }

  #[test]
  fn future_membership_is_ignored() {
    let p = with_memberships(vec![
      membership(1, "active", None),
      membership(2, "passive", Some(date(2045, 7, 31))),
    ]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(1));
  }

  #[test]
  fn only_future_memberships_selects_nothing() {
    let p = with_memberships(vec![membership(1, "active", Some(date(2045, 7, 31)))]);
    assert_eq!(p.current_membership(date(2022, 2, 23)), None);
  }

  #[test]
  fn latest_past_membership_wins() {
    let p = with_memberships(vec![
      membership(1, "active", Some(date(1998, 7, 31))),
      membership(2, "passive", Some(date(2010, 1, 1))),
      membership(3, "honorary", Some(date(2005, 1, 1))),
    ]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(2));
  }

  #[test]
  fn membership_effective_today_qualifies() {
    let p = with_memberships(vec![
      membership(1, "active", Some(date(1998, 7, 31))),
      membership(2, "passive", Some(date(2022, 2, 23))),
    ]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(2));
  }

  #[test]
  fn dated_membership_after_undated_replaces_it() {
    let p = with_memberships(vec![
      membership(1, "active", None),
      membership(2, "passive", Some(date(2010, 1, 1))),
    ]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(2));
  }

  /// Pins the iteration-order behaviour: an undated entry following a
  /// qualifying dated one overrides it.
  #[test]
  fn undated_membership_after_dated_overrides_it() {
    let p = with_memberships(vec![
      membership(1, "active", Some(date(2010, 1, 1))),
      membership(2, "passive", None),
    ]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(2));
  }

  #[test]
  fn equal_dates_keep_the_first() {
    let p = with_memberships(vec![
      membership(1, "active", Some(date(2010, 1, 1))),
      membership(2, "passive", Some(date(2010, 1, 1))),
    ]);
    assert_eq!(p.current_membership(date(2022, 2, 23)).map(|m| m.id), Some(1));
  }

  // ─── Conversions ──────────────────────────────────────────────────────────

  #[test]
  fn update_data_copies_mutable_fields() {
    let p = Person {
      id:            7,
      public_id:     "pid".into(),
      first_name:    "Harry".into(),
      last_name:     "Potter".into(),
      date_of_birth: Some(date(1980, 7, 31)),
      city:          "Little Whinging".into(),
      ..Default::default()
    };
    let data = p.to_update_data();
    assert_eq!(data.first_name, "Harry");
    assert_eq!(data.date_of_birth, Some(date(1980, 7, 31)));
    assert_eq!(data.city, "Little Whinging");
  }

  #[test]
  fn fixed_generator_is_deterministic() {
    let generate = fixed_generator("id");
    assert_eq!(generate(), "id");
    assert_eq!(generate(), "id");
    assert_ne!(uuid_generator()(), uuid_generator()());
  }
}
