// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tenant mutations.

use dairy_domain::TenantId;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::tenant_name_key;
use crate::diesel_schema::tenants;
use crate::error::PersistenceError;

/// Creates a new, active tenant.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `name` - The display name (unique by its lowercased key)
/// * `location` - The location
/// * `contact` - Optional contact details
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the name is taken,
/// or another error if the insert fails.
pub fn create_tenant(
    conn: &mut SqliteConnection,
    name: &str,
    location: &str,
    contact: Option<&str>,
) -> Result<TenantId, PersistenceError> {
    info!("Creating tenant with name: {}", name);

    diesel::insert_into(tenants::table)
        .values((
            tenants::name.eq(name),
            tenants::name_key.eq(tenant_name_key(name)),
            tenants::location.eq(location),
            tenants::contact.eq(contact),
        ))
        .execute(conn)?;

    let tenant_id: i64 = get_last_insert_rowid(conn)?;

    info!(tenant_id, "Tenant created successfully");
    Ok(TenantId::new(tenant_id))
}
