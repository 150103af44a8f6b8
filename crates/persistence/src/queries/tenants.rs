// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tenant queries.

use dairy_domain::{Tenant, TenantId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::{TenantRow, tenant_name_key};
use crate::diesel_schema::tenants;
use crate::error::PersistenceError;

/// Retrieves a tenant by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the tenant is not found.
pub fn get_tenant(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
) -> Result<Option<Tenant>, PersistenceError> {
    debug!("Looking up tenant by ID: {}", tenant_id);

    let result: Result<TenantRow, diesel::result::Error> = tenants::table
        .filter(tenants::tenant_id.eq(tenant_id.value()))
        .select(TenantRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(Tenant::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves a tenant by name, ignoring case.
///
/// Matches on the stored `name_key`, so non-ASCII letters fold too.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no tenant has that name.
pub fn find_tenant_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Tenant>, PersistenceError> {
    debug!("Looking up tenant by name: {}", name);

    let result: Result<TenantRow, diesel::result::Error> = tenants::table
        .filter(tenants::name_key.eq(tenant_name_key(name)))
        .select(TenantRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(Tenant::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists one page of tenants ordered by ID, together with the total count.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_tenants(
    conn: &mut SqliteConnection,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Tenant>, i64), PersistenceError> {
    let total: i64 = tenants::table.count().get_result(conn)?;

    let rows: Vec<TenantRow> = tenants::table
        .order(tenants::tenant_id.asc())
        .limit(limit)
        .offset(offset)
        .select(TenantRow::as_select())
        .load(conn)?;

    Ok((rows.into_iter().map(Tenant::from).collect(), total))
}
