// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collection record queries.
//!
//! Results are ordered by collection date, then time, then record ID.

use dairy_domain::{CollectionRecord, MemberCode, TenantId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use time::{Date, Time};

use crate::data_models::{CollectionRecordRow, format_date, format_time};
use crate::diesel_schema::collection_records;
use crate::error::PersistenceError;

fn into_records(rows: Vec<CollectionRecordRow>) -> Result<Vec<CollectionRecord>, PersistenceError> {
    rows.into_iter().map(CollectionRecord::try_from).collect()
}

/// Lists every record for a member code in a tenant.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is corrupt.
pub fn list_member_records(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    member_code: &MemberCode,
) -> Result<Vec<CollectionRecord>, PersistenceError> {
    let rows: Vec<CollectionRecordRow> = collection_records::table
        .filter(collection_records::tenant_id.eq(tenant_id.value()))
        .filter(collection_records::member_code.eq(member_code.value()))
        .order((
            collection_records::collection_date.asc(),
            collection_records::collection_time.asc(),
            collection_records::record_id.asc(),
        ))
        .select(CollectionRecordRow::as_select())
        .load(conn)?;

    into_records(rows)
}

/// Lists a member code's records for one auxiliary month and year.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is corrupt.
pub fn list_member_monthly_records(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    member_code: &MemberCode,
    auxiliary_month: &str,
    auxiliary_year: &str,
) -> Result<Vec<CollectionRecord>, PersistenceError> {
    let rows: Vec<CollectionRecordRow> = collection_records::table
        .filter(collection_records::tenant_id.eq(tenant_id.value()))
        .filter(collection_records::member_code.eq(member_code.value()))
        .filter(collection_records::auxiliary_month.eq(auxiliary_month))
        .filter(collection_records::auxiliary_year.eq(auxiliary_year))
        .order((
            collection_records::collection_date.asc(),
            collection_records::collection_time.asc(),
            collection_records::record_id.asc(),
        ))
        .select(CollectionRecordRow::as_select())
        .load(conn)?;

    into_records(rows)
}

/// Lists every record in a tenant for one auxiliary month and year.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is corrupt.
pub fn list_tenant_monthly_records(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    auxiliary_month: &str,
    auxiliary_year: &str,
) -> Result<Vec<CollectionRecord>, PersistenceError> {
    let rows: Vec<CollectionRecordRow> = collection_records::table
        .filter(collection_records::tenant_id.eq(tenant_id.value()))
        .filter(collection_records::auxiliary_month.eq(auxiliary_month))
        .filter(collection_records::auxiliary_year.eq(auxiliary_year))
        .order((
            collection_records::collection_date.asc(),
            collection_records::collection_time.asc(),
            collection_records::record_id.asc(),
        ))
        .select(CollectionRecordRow::as_select())
        .load(conn)?;

    into_records(rows)
}

/// Checks whether a record exists for `(tenant, member code, date, time)`.
///
/// Ingestion does not call this: repeat shifts at the same time are kept.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn collection_record_exists(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    member_code: &MemberCode,
    collection_date: Date,
    collection_time: Time,
) -> Result<bool, PersistenceError> {
    let date: String = format_date(collection_date)?;
    let time: String = format_time(collection_time)?;

    let exists: bool = diesel::select(diesel::dsl::exists(
        collection_records::table
            .filter(collection_records::tenant_id.eq(tenant_id.value()))
            .filter(collection_records::member_code.eq(member_code.value()))
            .filter(collection_records::collection_date.eq(&date))
            .filter(collection_records::collection_time.eq(&time)),
    ))
    .get_result(conn)?;

    Ok(exists)
}

/// Counts all records stored for a tenant.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tenant_records(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
) -> Result<i64, PersistenceError> {
    let count: i64 = collection_records::table
        .filter(collection_records::tenant_id.eq(tenant_id.value()))
        .count()
        .get_result(conn)?;
    Ok(count)
}
