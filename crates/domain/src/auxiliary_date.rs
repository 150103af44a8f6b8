// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Auxiliary (non-Gregorian) calendar dates.
//!
//! Collection exports carry a second, locally used calendar date next to
//! the Gregorian one. It is never converted. The raw string is kept and
//! decomposed into month and year tokens so records can be reported by
//! auxiliary month.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A `dd/MM/yyyy`-shaped auxiliary calendar date.
///
/// Only the shape is checked: exactly three `/`-separated segments.
/// Day and month ranges of the auxiliary calendar are not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuxiliaryDate {
    raw: String,
    month: String,
    year: String,
}

impl AuxiliaryDate {
    /// Decomposes a raw auxiliary date into month and year tokens.
    ///
    /// The month is the middle segment and the year the last one.
    /// Surrounding whitespace on the value and each segment is ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAuxiliaryDate` if the value is blank,
    /// does not have exactly three segments, or any segment is blank.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed: &str = raw.trim();
        let segments: Vec<&str> = trimmed.split('/').map(str::trim).collect();

        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(DomainError::InvalidAuxiliaryDate {
                value: trimmed.to_string(),
            });
        }

        Ok(Self {
            raw: trimmed.to_string(),
            month: segments[1].to_string(),
            year: segments[2].to_string(),
        })
    }

    /// Rebuilds an auxiliary date from already decomposed parts.
    ///
    /// Used when reading stored records back.
    #[must_use]
    pub const fn from_parts(raw: String, month: String, year: String) -> Self {
        Self { raw, month, year }
    }

    /// Returns the date as it appeared in the source file (trimmed).
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the month token.
    #[must_use]
    pub fn month(&self) -> &str {
        &self.month
    }

    /// Returns the year token.
    #[must_use]
    pub fn year(&self) -> &str {
        &self.year
    }
}

impl std::fmt::Display for AuxiliaryDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
