// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{AuxiliaryDate, DomainError};

#[test]
fn test_parse_decomposes_month_and_year() {
    let date: AuxiliaryDate = AuxiliaryDate::parse("27/06/2082").unwrap();

    assert_eq!(date.raw(), "27/06/2082");
    assert_eq!(date.month(), "06");
    assert_eq!(date.year(), "2082");
}

#[test]
fn test_parse_trims_value_and_segments() {
    let date: AuxiliaryDate = AuxiliaryDate::parse("  05 / 12 / 2081 ").unwrap();

    assert_eq!(date.raw(), "05 / 12 / 2081");
    assert_eq!(date.month(), "12");
    assert_eq!(date.year(), "2081");
}

#[test]
fn test_parse_does_not_validate_calendar_ranges() {
    // Month 14 and day 40 are accepted: only the shape is checked.
    let date: AuxiliaryDate = AuxiliaryDate::parse("40/14/2082").unwrap();
    assert_eq!(date.month(), "14");
}

#[test]
fn test_parse_rejects_wrong_segment_count() {
    let result: Result<AuxiliaryDate, DomainError> = AuxiliaryDate::parse("06/2082");
    assert!(matches!(
        result,
        Err(DomainError::InvalidAuxiliaryDate { value }) if value == "06/2082"
    ));

    assert!(AuxiliaryDate::parse("1/2/3/4").is_err());
    assert!(AuxiliaryDate::parse("2082-06-27").is_err());
}

#[test]
fn test_parse_rejects_blank_segments() {
    assert!(AuxiliaryDate::parse("").is_err());
    assert!(AuxiliaryDate::parse("27//2082").is_err());
    assert!(AuxiliaryDate::parse("27/06/").is_err());
}

#[test]
fn test_from_parts_round_trips_accessors() {
    let date: AuxiliaryDate = AuxiliaryDate::from_parts(
        String::from("01/02/2082"),
        String::from("02"),
        String::from("2082"),
    );
    assert_eq!(date, AuxiliaryDate::parse("01/02/2082").unwrap());
    assert_eq!(date.to_string(), "01/02/2082");
}
