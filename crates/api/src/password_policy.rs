// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password rules applied when farmers register and staff are created.
//!
//! Logins never run the policy; a stored hash is checked as-is.

use thiserror::Error;

/// Shortest password accepted, in characters.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Reasons a new password is refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must not be blank")]
    Blank,

    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    #[error("Password must not be the same as the phone number")]
    SameAsPhone,
}

/// Password policy for new farmer and staff credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum password length, counted in characters rather than bytes.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PASSWORD_LENGTH)
    }
}

impl PasswordPolicy {
    #[must_use]
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Checks a new password for the principal registered under `phone`.
    ///
    /// # Errors
    ///
    /// Returns the first rule the password breaks.
    pub fn validate(&self, password: &str, phone: &str) -> Result<(), PasswordPolicyError> {
        if password.trim().is_empty() {
            return Err(PasswordPolicyError::Blank);
        }
        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }
        if password == phone.trim() {
            return Err(PasswordPolicyError::SameAsPhone);
        }
        Ok(())
    }
}
