// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Farmer and staff mutations.
//!
//! Plain-text passwords are hashed with bcrypt here and never stored.

use dairy_domain::{MemberCode, TenantId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::diesel_schema::{farmers, staff};
use crate::error::PersistenceError;

/// Creates a new farmer.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `tenant_id` - The owning tenant
/// * `name` - The farmer's name
/// * `phone` - The farmer's phone number
/// * `member_code` - The cooperative-issued member code
/// * `password` - The plain-text password (will be hashed)
/// * `bcrypt_cost` - The bcrypt work factor
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the
/// `(tenant, phone, member code)` triple exists,
/// `PersistenceError::ForeignKeyViolation` if the tenant does not exist.
pub fn create_farmer(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    name: &str,
    phone: &str,
    member_code: &MemberCode,
    password: &str,
    bcrypt_cost: u32,
) -> Result<i64, PersistenceError> {
    let password_hash: String = bcrypt::hash(password, bcrypt_cost)?;

    diesel::insert_into(farmers::table)
        .values((
            farmers::tenant_id.eq(tenant_id.value()),
            farmers::name.eq(name),
            farmers::phone.eq(phone),
            farmers::member_code.eq(member_code.value()),
            farmers::password_hash.eq(&password_hash),
        ))
        .execute(conn)?;

    let farmer_id: i64 = get_last_insert_rowid(conn)?;

    info!(
        farmer_id,
        tenant_id = tenant_id.value(),
        member_code = member_code.value(),
        "Farmer registered"
    );
    Ok(farmer_id)
}

/// Creates a new staff member.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the `(tenant, phone)` pair
/// exists, `PersistenceError::ForeignKeyViolation` if the tenant does not exist.
pub fn create_staff(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    name: &str,
    phone: &str,
    password: &str,
    bcrypt_cost: u32,
) -> Result<i64, PersistenceError> {
    let password_hash: String = bcrypt::hash(password, bcrypt_cost)?;

    diesel::insert_into(staff::table)
        .values((
            staff::tenant_id.eq(tenant_id.value()),
            staff::name.eq(name),
            staff::phone.eq(phone),
            staff::password_hash.eq(&password_hash),
        ))
        .execute(conn)?;

    let staff_id: i64 = get_last_insert_rowid(conn)?;

    info!(staff_id, tenant_id = tenant_id.value(), "Staff created");
    Ok(staff_id)
}
