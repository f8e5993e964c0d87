//! Optional calendar dates and their text encoding.
//!
//! An absent date is encoded as the empty string, never as `NULL`, so that
//! every date column and every CSV date cell holds text.

use chrono::NaiveDate;

use crate::{Error, Result};

/// Calendar date format used for every persisted or exported date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: Option<NaiveDate>) -> String {
  date
    .map(|d| d.format(DATE_FORMAT).to_string())
    .unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` string. The empty string decodes to `None`.
pub fn parse_date(s: &str) -> Result<Option<NaiveDate>> {
  if s.is_empty() {
    return Ok(None);
  }
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map(Some)
    .map_err(|source| Error::InvalidDate { value: s.to_owned(), source })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_string_is_absent() {
    assert_eq!(parse_date("").unwrap(), None);
    assert_eq!(format_date(None), "");
  }

  #[test]
  fn iso_date_roundtrip() {
    let d = NaiveDate::from_ymd_opt(2021, 4, 5).unwrap();
    assert_eq!(format_date(Some(d)), "2021-04-05");
    assert_eq!(parse_date("2021-04-05").unwrap(), Some(d));
  }

  #[test]
  fn rejects_other_formats() {
    let err = parse_date("5.4.2021").unwrap_err();
    assert!(matches!(err, Error::InvalidDate { ref value, .. } if value == "5.4.2021"));
  }
}
