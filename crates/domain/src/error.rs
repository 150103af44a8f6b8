// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::TenantId;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Phone number does not match the accepted shape.
    InvalidPhone(String),
    /// Person name is empty or outside the accepted length.
    InvalidName(String),
    /// Member code is empty or invalid.
    InvalidMemberCode(String),
    /// Tenant display name is empty or invalid.
    InvalidTenantName(String),
    /// Tenant location is empty or invalid.
    InvalidLocation(String),
    /// Auxiliary calendar date is not three slash-separated segments.
    InvalidAuxiliaryDate {
        /// The raw value that failed to decompose.
        value: String,
    },
    /// The referenced tenant does not exist.
    TenantNotFound(TenantId),
    /// A tenant with the same name (case-insensitive) already exists.
    DuplicateTenant {
        /// The requested tenant name.
        name: String,
    },
    /// A farmer with the same (tenant, phone, member code) already exists.
    DuplicateFarmer {
        /// The tenant.
        tenant_id: TenantId,
        /// The farmer's phone number.
        phone: String,
        /// The farmer's member code.
        member_code: String,
    },
    /// A staff member with the same (tenant, phone) already exists.
    DuplicateStaff {
        /// The tenant.
        tenant_id: TenantId,
        /// The staff member's phone number.
        phone: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPhone(msg) => write!(f, "Invalid phone: {msg}"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidMemberCode(msg) => write!(f, "Invalid member code: {msg}"),
            Self::InvalidTenantName(msg) => write!(f, "Invalid dairy center name: {msg}"),
            Self::InvalidLocation(msg) => write!(f, "Invalid location: {msg}"),
            Self::InvalidAuxiliaryDate { value } => {
                write!(f, "Invalid auxiliary date format: {value}")
            }
            Self::TenantNotFound(tenant_id) => {
                write!(f, "Dairy center {tenant_id} not found")
            }
            Self::DuplicateTenant { name } => {
                write!(f, "Dairy center with name '{name}' already exists")
            }
            Self::DuplicateFarmer {
                tenant_id,
                phone,
                member_code,
            } => {
                write!(
                    f,
                    "Farmer with phone '{phone}' and member code '{member_code}' already exists in dairy center {tenant_id}"
                )
            }
            Self::DuplicateStaff { tenant_id, phone } => {
                write!(
                    f,
                    "Staff with phone '{phone}' already exists in dairy center {tenant_id}"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
