// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row shapes shared by queries and mutations, and their conversions
//! to and from domain values.

use dairy_domain::{
    AuxiliaryDate, CollectionRecord, FarmerPrincipal, MemberCode, StaffPrincipal, Tenant, TenantId,
};
use diesel::prelude::*;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Time};

use crate::diesel_schema::{collection_records, farmers, staff, tenants};
use crate::error::PersistenceError;

/// Storage format of collection dates. ISO ordering sorts chronologically.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Storage format of collection times.
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

/// Formats a collection date for storage.
pub fn format_date(date: Date) -> Result<String, PersistenceError> {
    date.format(DATE_FORMAT)
        .map_err(|e| PersistenceError::CorruptRow(format!("Cannot format date {date}: {e}")))
}

/// Formats a collection time for storage.
pub fn format_time(time: Time) -> Result<String, PersistenceError> {
    time.format(TIME_FORMAT)
        .map_err(|e| PersistenceError::CorruptRow(format!("Cannot format time {time}: {e}")))
}

/// Key under which tenant names are unique and looked up.
///
/// Lowercasing is done here rather than by an SQLite collation, which
/// only folds ASCII letters.
pub fn tenant_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = tenants)]
pub struct TenantRow {
    pub tenant_id: i64,
    pub name: String,
    pub location: String,
    pub contact: Option<String>,
    pub is_active: i32,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Self {
            tenant_id: TenantId::new(row.tenant_id),
            name: row.name,
            location: row.location,
            contact: row.contact,
            is_active: row.is_active != 0,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = farmers)]
pub struct FarmerRow {
    pub farmer_id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub phone: String,
    pub member_code: String,
    pub password_hash: String,
}

impl From<FarmerRow> for FarmerPrincipal {
    fn from(row: FarmerRow) -> Self {
        Self {
            farmer_id: row.farmer_id,
            tenant_id: TenantId::new(row.tenant_id),
            name: row.name,
            phone: row.phone,
            member_code: MemberCode::new(&row.member_code),
            password_hash: row.password_hash,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = staff)]
pub struct StaffRow {
    pub staff_id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub phone: String,
    pub password_hash: String,
}

impl From<StaffRow> for StaffPrincipal {
    fn from(row: StaffRow) -> Self {
        Self {
            staff_id: row.staff_id,
            tenant_id: TenantId::new(row.tenant_id),
            name: row.name,
            phone: row.phone,
            password_hash: row.password_hash,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = collection_records)]
pub struct CollectionRecordRow {
    pub record_id: i64,
    pub tenant_id: i64,
    pub member_code: String,
    pub collection_date: String,
    pub auxiliary_date: String,
    pub auxiliary_month: String,
    pub auxiliary_year: String,
    pub collection_time: String,
    pub volume_litres: f64,
    pub fat_percentage: f64,
    pub snf: f64,
    pub rate: f64,
    pub amount: f64,
    pub remark: Option<String>,
}

impl TryFrom<CollectionRecordRow> for CollectionRecord {
    type Error = PersistenceError;

    fn try_from(row: CollectionRecordRow) -> Result<Self, Self::Error> {
        let collection_date: Date = Date::parse(&row.collection_date, DATE_FORMAT).map_err(|e| {
            PersistenceError::CorruptRow(format!(
                "record {}: invalid collection_date '{}': {e}",
                row.record_id, row.collection_date
            ))
        })?;
        let collection_time: Time = Time::parse(&row.collection_time, TIME_FORMAT).map_err(|e| {
            PersistenceError::CorruptRow(format!(
                "record {}: invalid collection_time '{}': {e}",
                row.record_id, row.collection_time
            ))
        })?;

        Ok(Self {
            record_id: Some(row.record_id),
            tenant_id: TenantId::new(row.tenant_id),
            member_code: MemberCode::new(&row.member_code),
            collection_date,
            auxiliary_date: AuxiliaryDate::from_parts(
                row.auxiliary_date,
                row.auxiliary_month,
                row.auxiliary_year,
            ),
            collection_time,
            volume_litres: row.volume_litres,
            fat_percentage: row.fat_percentage,
            snf: row.snf,
            rate: row.rate,
            amount: row.amount,
            remark: row.remark,
        })
    }
}

/// Insertable collection record.
///
/// `remark` is bound as `NULL` rather than `DEFAULT` so that a whole batch
/// can go out as one multi-row `INSERT` on `SQLite`.
#[derive(Insertable)]
#[diesel(table_name = collection_records)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewCollectionRecordRow<'a> {
    pub tenant_id: i64,
    pub member_code: &'a str,
    pub collection_date: String,
    pub auxiliary_date: &'a str,
    pub auxiliary_month: &'a str,
    pub auxiliary_year: &'a str,
    pub collection_time: String,
    pub volume_litres: f64,
    pub fat_percentage: f64,
    pub snf: f64,
    pub rate: f64,
    pub amount: f64,
    pub remark: Option<&'a str>,
}

impl<'a> NewCollectionRecordRow<'a> {
    /// Builds an insertable row from a domain record.
    ///
    /// # Errors
    ///
    /// Returns an error if the date or time cannot be formatted.
    pub fn from_record(record: &'a CollectionRecord) -> Result<Self, PersistenceError> {
        Ok(Self {
            tenant_id: record.tenant_id.value(),
            member_code: record.member_code.value(),
            collection_date: format_date(record.collection_date)?,
            auxiliary_date: record.auxiliary_date.raw(),
            auxiliary_month: record.auxiliary_date.month(),
            auxiliary_year: record.auxiliary_date.year(),
            collection_time: format_time(record.collection_time)?,
            volume_litres: record.volume_litres,
            fat_percentage: record.fat_percentage,
            snf: record.snf,
            rate: record.rate,
            amount: record.amount,
            remark: record.remark.as_deref(),
        })
    }
}
