//! Conversions between domain types and the plain-text SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`; an absent date is the empty string.
//! Every decoder takes the name of the calling operation so that a malformed
//! row is reported with context.

use chrono::NaiveDate;
use xone_core::{
  date::{format_date, parse_date},
  membership::{Membership, MembershipType},
  person::Person,
};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(date: Option<NaiveDate>) -> String { format_date(date) }

pub fn decode_date(op: &'static str, s: &str) -> Result<Option<NaiveDate>> {
  parse_date(s).map_err(|e| match e {
    xone_core::Error::InvalidDate { value, source } => Error::DateParse { op, value, source },
    other => Error::Core(other),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every person query; matches [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "p.id, p.public_id, p.first_name, p.last_name, \
  p.date_of_birth, p.email, p.phone, p.mobile, p.street, p.house_number, \
  p.zip_code, p.city";

/// Number of columns in [`PERSON_COLUMNS`].
pub const PERSON_COLUMN_COUNT: usize = 12;

/// Raw values read from a `person` row.
pub struct RawPerson {
  pub id:            i64,
  pub public_id:     String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: String,
  pub email:         String,
  pub phone:         String,
  pub mobile:        String,
  pub street:        String,
  pub house_number:  String,
  pub zip_code:      String,
  pub city:          String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      public_id:     row.get(1)?,
      first_name:    row.get(2)?,
      last_name:     row.get(3)?,
      date_of_birth: row.get(4)?,
      email:         row.get(5)?,
      phone:         row.get(6)?,
      mobile:        row.get(7)?,
      street:        row.get(8)?,
      house_number:  row.get(9)?,
      zip_code:      row.get(10)?,
      city:          row.get(11)?,
    })
  }

  /// Decode into a [`Person`] without memberships.
  pub fn into_person(self, op: &'static str) -> Result<Person> {
    Ok(Person {
      id:            self.id,
      public_id:     self.public_id,
      first_name:    self.first_name,
      last_name:     self.last_name,
      date_of_birth: decode_date(op, &self.date_of_birth)?,
      email:         self.email,
      phone:         self.phone,
      mobile:        self.mobile,
      street:        self.street,
      house_number:  self.house_number,
      zip_code:      self.zip_code,
      city:          self.city,
      memberships:   Vec::new(),
    })
  }
}

/// Column list shared by every membership query; matches
/// [`RawMembership::from_row`].
pub const MEMBERSHIP_COLUMNS: &str = "m.id, m.effective_from, t.id, t.name";

/// Raw values read from a `membership` row joined with its type.
pub struct RawMembership {
  pub id:             i64,
  pub effective_from: String,
  pub type_id:        i64,
  pub type_name:      String,
}

impl RawMembership {
  /// Read the four membership columns starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(offset)?,
      effective_from: row.get(offset + 1)?,
      type_id:        row.get(offset + 2)?,
      type_name:      row.get(offset + 3)?,
    })
  }

  pub fn into_membership(self, op: &'static str) -> Result<Membership> {
    Ok(Membership {
      id:              self.id,
      membership_type: MembershipType { id: self.type_id, name: self.type_name },
      effective_from:  decode_date(op, &self.effective_from)?,
    })
  }
}
