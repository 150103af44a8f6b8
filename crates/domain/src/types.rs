// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use time::{Date, Time};

use crate::auxiliary_date::AuxiliaryDate;

/// Identifier of a tenant (dairy center).
///
/// Every farmer, staff member and collection record carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    /// Wraps a raw tenant identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cooperative-issued farmer identifier.
///
/// Member codes are tenant-local; the same code may exist in two tenants.
/// The value is stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberCode(String);

impl MemberCode {
    /// Creates a member code, trimming surrounding whitespace.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    /// Returns the member code value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An onboarded dairy center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// The tenant identifier.
    pub tenant_id: TenantId,
    /// Display name, unique across tenants ignoring case.
    pub name: String,
    /// Physical location.
    pub location: String,
    /// Optional contact number or address.
    pub contact: Option<String>,
    /// Whether the tenant is active. Tenants are never hard-deleted.
    pub is_active: bool,
}

/// A registered farmer.
///
/// Natural key is `(tenant_id, phone, member_code)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmerPrincipal {
    pub farmer_id: i64,
    pub tenant_id: TenantId,
    pub name: String,
    pub phone: String,
    pub member_code: MemberCode,
    pub password_hash: String,
}

/// A dairy staff member.
///
/// Natural key is `(tenant_id, phone)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffPrincipal {
    pub staff_id: i64,
    pub tenant_id: TenantId,
    pub name: String,
    pub phone: String,
    pub password_hash: String,
}

/// One milk-intake measurement for a member code.
///
/// The member code is a soft reference: no registered farmer is required.
/// Several records per member code per day are valid (one per shift).
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRecord {
    /// Storage identifier; `None` until persisted.
    pub record_id: Option<i64>,
    pub tenant_id: TenantId,
    pub member_code: MemberCode,
    /// Gregorian collection date.
    pub collection_date: Date,
    pub auxiliary_date: AuxiliaryDate,
    pub collection_time: Time,
    pub volume_litres: f64,
    pub fat_percentage: f64,
    /// Solids-not-fat.
    pub snf: f64,
    pub rate: f64,
    pub amount: f64,
    pub remark: Option<String>,
}
