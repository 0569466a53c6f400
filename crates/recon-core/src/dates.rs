//! Contact-date parsing.
//!
//! Exports carry dates either in the source system's US-style display format
//! (`8/9/2018 12:00:00 AM`) or, after a round trip through another tool, in
//! ISO form. Only the calendar date matters for contact ordering.

use chrono::{NaiveDate, NaiveDateTime};

use crate::value::Scalar;

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Parse a contact date from its textual form.
///
/// Returns `None` for blank or unrecognised input.
#[must_use]
pub fn parse_contact_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d);
        }
    }
    None
}

/// Parse a contact date held in an export cell. Only text cells carry dates.
#[must_use]
pub fn scalar_date(value: &Scalar) -> Option<NaiveDate> {
    value.as_str().and_then(parse_contact_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("8/9/2018 12:00:00 AM", Some((2018, 8, 9)))]
    #[case("12/31/2019 11:59:00 PM", Some((2019, 12, 31)))]
    #[case("8/9/2018", Some((2018, 8, 9)))]
    #[case("2018-08-09", Some((2018, 8, 9)))]
    #[case("2018-08-09 00:00:00", Some((2018, 8, 9)))]
    #[case("2018-08-09T13:45:00", Some((2018, 8, 9)))]
    #[case("  ", None)]
    #[case("yesterday", None)]
    fn parses_export_formats(#[case] input: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(parse_contact_date(input), expected);
    }

    #[test]
    fn numeric_cells_are_not_dates() {
        assert_eq!(scalar_date(&Scalar::Int(20_180_809)), None);
        assert_eq!(scalar_date(&Scalar::Null), None);
    }
}
