// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Domain model for the dairy collection back-office.
//!
//! Tenants (dairy centers) are the root of data isolation. Farmers and
//! staff are two unrelated principal kinds, each keyed inside a tenant,
//! and collection records reference farmers softly by member code.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auxiliary_date;
mod error;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use auxiliary_date::AuxiliaryDate;
pub use error::DomainError;
pub use types::{
    CollectionRecord, FarmerPrincipal, MemberCode, StaffPrincipal, Tenant, TenantId,
};
pub use validation::{
    validate_member_code, validate_person_name, validate_phone, validate_tenant_fields,
};
