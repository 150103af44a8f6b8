// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Farmer and staff queries.
//!
//! Farmers and staff share no table. Each lookup uses the natural key of
//! its principal kind inside a single tenant.

use std::collections::HashMap;

use dairy_domain::{FarmerPrincipal, MemberCode, StaffPrincipal, TenantId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::{FarmerRow, StaffRow};
use crate::diesel_schema::{farmers, staff};
use crate::error::PersistenceError;

/// Retrieves a farmer by `(tenant, phone, member code)`.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no farmer matches.
pub fn find_farmer(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    phone: &str,
    member_code: &MemberCode,
) -> Result<Option<FarmerPrincipal>, PersistenceError> {
    debug!(
        tenant_id = tenant_id.value(),
        member_code = member_code.value(),
        "Looking up farmer"
    );

    let result: Result<FarmerRow, diesel::result::Error> = farmers::table
        .filter(farmers::tenant_id.eq(tenant_id.value()))
        .filter(farmers::phone.eq(phone))
        .filter(farmers::member_code.eq(member_code.value()))
        .select(FarmerRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(FarmerPrincipal::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves the first registered farmer holding a member code in a tenant.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no farmer holds the member code.
pub fn find_farmer_by_member_code(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    member_code: &MemberCode,
) -> Result<Option<FarmerPrincipal>, PersistenceError> {
    let result: Result<FarmerRow, diesel::result::Error> = farmers::table
        .filter(farmers::tenant_id.eq(tenant_id.value()))
        .filter(farmers::member_code.eq(member_code.value()))
        .order(farmers::farmer_id.asc())
        .select(FarmerRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(FarmerPrincipal::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Maps every member code registered in a tenant to a farmer name.
///
/// When several farmers share a member code the earliest registration wins.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn farmer_names_by_member_code(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
) -> Result<HashMap<String, String>, PersistenceError> {
    let rows: Vec<(String, String)> = farmers::table
        .filter(farmers::tenant_id.eq(tenant_id.value()))
        .order(farmers::farmer_id.asc())
        .select((farmers::member_code, farmers::name))
        .load(conn)?;

    let mut names: HashMap<String, String> = HashMap::with_capacity(rows.len());
    for (member_code, name) in rows {
        names.entry(member_code).or_insert(name);
    }
    Ok(names)
}

/// Retrieves a staff member by `(tenant, phone)`.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no staff member matches.
pub fn find_staff(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    phone: &str,
) -> Result<Option<StaffPrincipal>, PersistenceError> {
    debug!(tenant_id = tenant_id.value(), "Looking up staff by phone");

    let result: Result<StaffRow, diesel::result::Error> = staff::table
        .filter(staff::tenant_id.eq(tenant_id.value()))
        .filter(staff::phone.eq(phone))
        .select(StaffRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(StaffPrincipal::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists one page of a tenant's staff ordered by ID, with the tenant's total.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_staff(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    offset: i64,
    limit: i64,
) -> Result<(Vec<StaffPrincipal>, i64), PersistenceError> {
    let total: i64 = staff::table
        .filter(staff::tenant_id.eq(tenant_id.value()))
        .count()
        .get_result(conn)?;

    let rows: Vec<StaffRow> = staff::table
        .filter(staff::tenant_id.eq(tenant_id.value()))
        .order(staff::staff_id.asc())
        .limit(limit)
        .offset(offset)
        .select(StaffRow::as_select())
        .load(conn)?;

    Ok((rows.into_iter().map(StaffPrincipal::from).collect(), total))
}
