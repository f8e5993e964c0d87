//! Flat-file person source for xone.
//!
//! Persons are exchanged as headerless CSV with the fixed column order
//! first name, last name, date of birth (`YYYY-MM-DD`, empty if unknown).
//! A fourth column (gender) written by older exports is accepted on read and
//! ignored. [`CsvPersonStore`] exposes a file as a
//! [`PersonRepository`](xone_core::store::PersonRepository).
//!
//! ```no_run
//! let persons = xone_csv::read_file("members.csv").unwrap();
//! xone_csv::write_file("copy.csv", &persons).unwrap();
//! ```

pub mod error;
mod parse;
mod serialize;
mod store;

use std::{fs::File, io, path::Path};

pub use error::{Error, Result};
pub use store::CsvPersonStore;
use xone_core::person::Person;

/// Parse persons from CSV. Only personal data is populated; ids are zero and
/// public ids empty.
pub fn read<R: io::Read>(src: R) -> Result<Vec<Person>> { parse::read_persons(src) }

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Person>> {
  read(io::BufReader::new(File::open(path)?))
}

/// Write the personal data of `persons` as CSV.
pub fn write<W: io::Write>(dst: W, persons: &[Person]) -> Result<()> {
  serialize::write_persons(dst, persons)
}

pub fn write_file(path: impl AsRef<Path>, persons: &[Person]) -> Result<()> {
  write(io::BufWriter::new(File::create(path)?), persons)
}

#[cfg(test)]
mod roundtrip_tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn file_roundtrip_keeps_personal_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persons.csv");
    let persons = vec![
      Person {
        first_name: "Harry".into(),
        last_name: "Potter".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1980, 7, 31),
        ..Default::default()
      },
      Person {
        first_name: "Hermione".into(),
        last_name: "Granger ".into(),
        ..Default::default()
      },
    ];

    write_file(&path, &persons).unwrap();
    assert_eq!(read_file(&path).unwrap(), persons);
  }

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_file(dir.path().join("missing.csv")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
  }
}
