// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::MemberCode;

/// Required prefix for accepted phone numbers.
const PHONE_PREFIX: &str = "98";

/// Total digit count of an accepted phone number.
const PHONE_LENGTH: usize = 10;

/// Minimum person name length, in characters.
const NAME_MIN_LENGTH: usize = 2;

/// Maximum person name length, in characters.
const NAME_MAX_LENGTH: usize = 100;

/// Validates a phone number.
///
/// Accepted numbers are exactly ten ASCII digits starting with `98`.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhone` if the number has another shape.
pub fn validate_phone(phone: &str) -> Result<(), DomainError> {
    let valid: bool = phone.len() == PHONE_LENGTH
        && phone.starts_with(PHONE_PREFIX)
        && phone.bytes().all(|b| b.is_ascii_digit());

    if !valid {
        return Err(DomainError::InvalidPhone(String::from(
            "Phone number must be 10 digits starting with 98",
        )));
    }
    Ok(())
}

/// Validates a farmer or staff display name.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the trimmed name is blank or
/// not between 2 and 100 characters.
pub fn validate_person_name(name: &str) -> Result<(), DomainError> {
    let trimmed: &str = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName(String::from("Name is required")));
    }

    let length: usize = trimmed.chars().count();
    if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
        return Err(DomainError::InvalidName(format!(
            "Name must be between {NAME_MIN_LENGTH} and {NAME_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates a member code.
///
/// # Errors
///
/// Returns `DomainError::InvalidMemberCode` if the code is blank.
pub fn validate_member_code(member_code: &MemberCode) -> Result<(), DomainError> {
    if member_code.value().is_empty() {
        return Err(DomainError::InvalidMemberCode(String::from(
            "Member code is required",
        )));
    }
    Ok(())
}

/// Validates the fields of a tenant onboarding request.
///
/// Contact is optional and not checked.
///
/// # Errors
///
/// Returns an error if the name or location is blank.
pub fn validate_tenant_fields(name: &str, location: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidTenantName(String::from(
            "Dairy center name is required",
        )));
    }

    if location.trim().is_empty() {
        return Err(DomainError::InvalidLocation(String::from(
            "Location is required",
        )));
    }
    Ok(())
}
