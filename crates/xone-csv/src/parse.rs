//! CSV → [`Person`].

use std::io::Read;

use xone_core::{date::parse_date, person::Person};

use crate::{Error, Result};

const MIN_COLUMNS: usize = 3;

pub fn read_persons<R: Read>(src: R) -> Result<Vec<Person>> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_reader(src);

  let mut persons = Vec::new();
  for record in reader.records() {
    let record = record?;
    let line = record.position().map_or(0, |p| p.line());

    if record.len() < MIN_COLUMNS {
      return Err(Error::MissingColumns { line, found: record.len() });
    }

    // Only leading whitespace is insignificant.
    let field = |i: usize| record[i].trim_start();

    let dob = field(2);
    let date_of_birth = parse_date(dob)
      .map_err(|_| Error::InvalidDate { line, value: dob.to_owned() })?;

    // A fourth column (gender) is accepted for compatibility and ignored.
    persons.push(Person {
      first_name: field(0).to_owned(),
      last_name: field(1).to_owned(),
      date_of_birth,
      ..Default::default()
    });
  }

  Ok(persons)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn reads_three_columns() {
    let input = "Harry, Potter, 1980-07-31\nRon,Weasley,1980-03-01\n";
    let persons = read_persons(input.as_bytes()).unwrap();

    assert_eq!(persons.len(), 2);
    assert_eq!(persons[0].first_name, "Harry");
    assert_eq!(persons[0].last_name, "Potter");
    assert_eq!(persons[0].date_of_birth, NaiveDate::from_ymd_opt(1980, 7, 31));
    assert_eq!(persons[1].first_name, "Ron");
  }

  #[test]
  fn keeps_trailing_whitespace() {
    let persons = read_persons("  Harry ,Potter  , 1980-07-31\n".as_bytes()).unwrap();
    assert_eq!(persons[0].first_name, "Harry ");
    assert_eq!(persons[0].last_name, "Potter  ");
    assert_eq!(persons[0].date_of_birth, NaiveDate::from_ymd_opt(1980, 7, 31));
  }

  #[test]
  fn ignores_gender_column() {
    let persons = read_persons("Hermione,Granger,1979-09-19,f\n".as_bytes()).unwrap();
    assert_eq!(persons[0].first_name, "Hermione");
  }

  #[test]
  fn empty_date_is_absent() {
    let persons = read_persons("Nearly,Headless,\n".as_bytes()).unwrap();
    assert_eq!(persons[0].date_of_birth, None);
  }

  #[test]
  fn empty_input_yields_nothing() {
    assert!(read_persons("".as_bytes()).unwrap().is_empty());
  }

  #[test]
  fn too_few_columns() {
    let err = read_persons("Harry,Potter\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MissingColumns { line: 1, found: 2 }));
  }

  #[test]
  fn invalid_date_reports_line() {
    let input = "Harry,Potter,1980-07-31\nRon,Weasley,1.3.1980\n";
    let err = read_persons(input.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::InvalidDate { line: 2, ref value } if value == "1.3.1980"));
  }
}
