// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for the password policy.

use crate::{ApiError, PasswordPolicy, PasswordPolicyError};

#[test]
fn test_valid_password_passes() {
    let policy: PasswordPolicy = PasswordPolicy::default();
    assert!(policy.validate("milk-secret", "9812345678").is_ok());
}

#[test]
fn test_short_password_rejected() {
    let policy: PasswordPolicy = PasswordPolicy::default();

    let result = policy.validate("abc", "9812345678");

    assert_eq!(result, Err(PasswordPolicyError::TooShort { min_length: 6 }));
}

#[test]
fn test_length_counts_characters_not_bytes() {
    let policy: PasswordPolicy = PasswordPolicy::default();

    // Four characters, twelve bytes.
    assert!(policy.validate("कखगघ", "9812345678").is_err());
    assert!(policy.validate("कखगघङच", "9812345678").is_ok());
}

#[test]
fn test_password_equal_to_phone_rejected() {
    let policy: PasswordPolicy = PasswordPolicy::default();

    let result = policy.validate("9812345678", "9812345678");

    assert_eq!(result, Err(PasswordPolicyError::SameAsPhone));
}

#[test]
fn test_blank_password_rejected_before_length() {
    let policy: PasswordPolicy = PasswordPolicy::default();

    assert_eq!(
        policy.validate("        ", "9812345678"),
        Err(PasswordPolicyError::Blank)
    );
}

#[test]
fn test_custom_minimum_length() {
    let policy: PasswordPolicy = PasswordPolicy::new(10);

    assert_eq!(
        policy.validate("milk-secret", "9812345678"),
        Ok(())
    );
    assert_eq!(
        policy.validate("milk-pass", "9812345678"),
        Err(PasswordPolicyError::TooShort { min_length: 10 })
    );
}

#[test]
fn test_policy_error_becomes_api_error() {
    let err: ApiError = PasswordPolicyError::TooShort { min_length: 6 }.into();

    assert_eq!(
        err,
        ApiError::PasswordPolicyViolation {
            message: String::from("Password must be at least 6 characters long")
        }
    );
}
