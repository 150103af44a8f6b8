// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collection record mutations.

use dairy_domain::CollectionRecord;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::NewCollectionRecordRow;
use crate::diesel_schema::collection_records;
use crate::error::PersistenceError;

/// Inserts a batch of collection records in one transaction.
///
/// Either every record in the batch is stored or none is. Inside a
/// transaction opened with `Persistence::begin_transaction` the batch runs
/// as a savepoint, and the outer rollback discards it too.
///
/// # Errors
///
/// Returns an error if any insert fails; the transaction is rolled back.
pub fn insert_collection_records(
    conn: &mut SqliteConnection,
    records: &[CollectionRecord],
) -> Result<usize, PersistenceError> {
    if records.is_empty() {
        return Ok(0);
    }

    let rows: Vec<NewCollectionRecordRow<'_>> = records
        .iter()
        .map(NewCollectionRecordRow::from_record)
        .collect::<Result<_, _>>()?;

    let inserted: usize = conn.transaction::<usize, PersistenceError, _>(|conn| {
        Ok(diesel::insert_into(collection_records::table)
            .values(&rows)
            .execute(conn)?)
    })?;

    debug!(inserted, "Collection record batch committed");
    Ok(inserted)
}
