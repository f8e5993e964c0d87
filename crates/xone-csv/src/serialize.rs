//! [`Person`] → CSV.

use std::io::Write;

use xone_core::{date::format_date, person::Person};

use crate::Result;

pub fn write_persons<W: Write>(dst: W, persons: &[Person]) -> Result<()> {
  let mut writer = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(dst);

  for person in persons {
    let dob = format_date(person.date_of_birth);
    writer.write_record([person.first_name.as_str(), person.last_name.as_str(), dob.as_str()])?;
  }

  writer.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn writes_one_line_per_person() {
    let persons = [
      Person {
        first_name: "Harry".into(),
        last_name: "Potter".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1980, 7, 31),
        ..Default::default()
      },
      Person {
        first_name: "Nearly".into(),
        last_name: "Headless, Nick".into(),
        ..Default::default()
      },
    ];

    let mut out = Vec::new();
    write_persons(&mut out, &persons).unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "Harry,Potter,1980-07-31\nNearly,\"Headless, Nick\",\n"
    );
  }
}
