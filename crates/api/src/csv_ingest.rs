// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Milk-analyzer CSV ingestion.
//!
//! An upload is processed in three steps:
//!
//! 1. The header row is read and normalized (trimmed, lowercased, BOM
//!    stripped). Each logical field is looked up through an ordered alias
//!    list.
//! 2. Every data row is decoded independently by [`decode_row`], a pure
//!    function returning either a record or a [`RowDecodeError`]. A failed
//!    row is recorded with its 1-based row number and decoding moves on.
//! 3. Decoded records are flushed to a [`CollectionRecordSink`] in batches
//!    of [`BATCH_SIZE`], with a final partial flush at end of file. The
//!    whole upload is one unit of work on the sink: if any batch fails,
//!    every batch already flushed is rolled back too.
//!
//! No farmer lookup and no duplicate check happen here: a member code with
//! no registered farmer is accepted, and identical rows are stored twice.

use std::collections::HashMap;

use csv::StringRecord;
use dairy_domain::{AuxiliaryDate, CollectionRecord, MemberCode, TenantId};
use dairy_persistence::{Persistence, PersistenceError};
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Time};
use tracing::{debug, info, warn};

/// Number of decoded records written per storage call.
pub const BATCH_SIZE: usize = 50;

/// Primary date format tried first: `2025-10-13`.
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Fallback date format used by the analyzer: `10/26/2025`.
const US_DATE: &[BorrowedFormatItem<'static>] = format_description!("[month]/[day]/[year]");

/// Collection time format: `06:30`.
const CLOCK_TIME: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

/// A logical CSV field and the header spellings accepted for it.
///
/// Aliases are compared case-insensitively, in order.
struct FieldSpec {
    aliases: &'static [&'static str],
}

const COLLECTION_DATE: FieldSpec = FieldSpec {
    aliases: &["Coll_date"],
};
const AUXILIARY_DATE: FieldSpec = FieldSpec {
    aliases: &["Ne_date"],
};
const COLLECTION_TIME: FieldSpec = FieldSpec {
    aliases: &["Coll_time"],
};
const MEMBER_CODE: FieldSpec = FieldSpec {
    aliases: &["Mem_code"],
};
const VOLUME: FieldSpec = FieldSpec {
    aliases: &["Volume_lt"],
};
const FAT: FieldSpec = FieldSpec {
    aliases: &["Fat_per"],
};
const SNF: FieldSpec = FieldSpec { aliases: &["Snf"] };
const RATE: FieldSpec = FieldSpec { aliases: &["Rate"] };
const AMOUNT: FieldSpec = FieldSpec {
    aliases: &["Amount"],
};
const REMARK: FieldSpec = FieldSpec {
    aliases: &["Remark", "Remarks"],
};

/// Why a single row was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowDecodeError {
    /// No accepted column held a non-blank value.
    #[error("Required field not found. Tried: {tried}")]
    MissingField { tried: String },

    /// Collection date matched neither accepted format.
    #[error("Invalid date format: {value} (expected yyyy-MM-dd or MM/dd/yyyy)")]
    InvalidDate { value: String },

    /// Auxiliary date is not three slash-separated segments.
    #[error("Invalid auxiliary date format: {value}")]
    InvalidAuxiliaryDate { value: String },

    /// Collection time is not `HH:mm`.
    #[error("Invalid time format: {value}")]
    InvalidTime { value: String },

    /// A measurement is not a finite decimal number.
    #[error("Invalid numeric value: {value}")]
    InvalidNumber { value: String },

    /// The CSV reader could not decode the record itself.
    #[error("Malformed CSV record: {reason}")]
    Malformed { reason: String },
}

/// Errors that fail a whole upload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CsvIngestError {
    /// The upload has no content.
    #[error("CSV file is empty")]
    EmptyFile,

    /// The header row could not be read.
    #[error("CSV file could not be read: {reason}")]
    Unreadable { reason: String },

    /// The file has a header but no data rows.
    #[error("CSV file contains no data rows")]
    NoRecords,

    /// A batch could not be stored. Nothing from the upload is kept.
    #[error("Failed to store collection records: {0}")]
    Storage(PersistenceError),
}

/// One rejected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based data row number; the header is not counted.
    pub row_number: usize,
    pub message: String,
}

/// Outcome of an upload that was processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub total_records: usize,
    pub successful_records: usize,
    pub failed_records: usize,
    /// Failures in input order.
    pub errors: Vec<RowFailure>,
}

/// Durable destination for decoded records.
///
/// One upload is one unit of work: `begin` runs before the first batch,
/// then either `commit` after the last one or `rollback` on any failure.
pub trait CollectionRecordSink {
    /// Starts the unit of work for one upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit of work cannot be started.
    fn begin(&mut self) -> Result<(), PersistenceError>;

    /// Stores a batch of records and returns how many were stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be stored.
    fn insert_batch(&mut self, records: &[CollectionRecord]) -> Result<usize, PersistenceError>;

    /// Makes every batch since `begin` durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the batches could not be made durable; none of
    /// them are kept in that case.
    fn commit(&mut self) -> Result<(), PersistenceError>;

    /// Discards every batch since `begin`.
    fn rollback(&mut self);
}

impl CollectionRecordSink for Persistence {
    fn begin(&mut self) -> Result<(), PersistenceError> {
        self.begin_transaction()
    }

    fn insert_batch(&mut self, records: &[CollectionRecord]) -> Result<usize, PersistenceError> {
        self.insert_collection_records(records)
    }

    fn commit(&mut self) -> Result<(), PersistenceError> {
        self.commit_transaction()
    }

    fn rollback(&mut self) {
        self.rollback_transaction();
    }
}

/// Normalized header name to column index. First occurrence wins.
#[derive(Debug, Default)]
pub struct ColumnIndex {
    columns: HashMap<String, usize>,
}

/// Normalizes a CSV header for case-insensitive, whitespace-tolerant matching.
fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

impl ColumnIndex {
    /// Builds the index from a header record.
    #[must_use]
    pub fn from_headers(headers: &StringRecord) -> Self {
        let mut columns: HashMap<String, usize> = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            columns.entry(normalize_header(header)).or_insert(idx);
        }
        Self { columns }
    }

    /// Returns the first non-blank trimmed value among the field's aliases.
    fn lookup<'r>(&self, record: &'r StringRecord, field: &FieldSpec) -> Option<&'r str> {
        field.aliases.iter().find_map(|alias| {
            self.columns
                .get(&normalize_header(alias))
                .and_then(|&idx| record.get(idx))
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
    }

    fn required<'r>(
        &self,
        record: &'r StringRecord,
        field: &FieldSpec,
    ) -> Result<&'r str, RowDecodeError> {
        self.lookup(record, field)
            .ok_or_else(|| RowDecodeError::MissingField {
                tried: field.aliases.join(", "),
            })
    }
}

/// Parses a collection date as `yyyy-MM-dd`, falling back to `MM/dd/yyyy`.
///
/// # Errors
///
/// Returns `RowDecodeError::InvalidDate` if neither format matches.
pub fn parse_collection_date(value: &str) -> Result<Date, RowDecodeError> {
    Date::parse(value, ISO_DATE)
        .or_else(|_| Date::parse(value, US_DATE))
        .map_err(|_| RowDecodeError::InvalidDate {
            value: value.to_string(),
        })
}

/// Parses a collection time as `HH:mm`.
///
/// # Errors
///
/// Returns `RowDecodeError::InvalidTime` if the value has another shape.
pub fn parse_collection_time(value: &str) -> Result<Time, RowDecodeError> {
    Time::parse(value, CLOCK_TIME).map_err(|_| RowDecodeError::InvalidTime {
        value: value.to_string(),
    })
}

/// Parses a finite decimal measurement.
///
/// # Errors
///
/// Returns `RowDecodeError::InvalidNumber` for non-numeric or non-finite input.
pub fn parse_measurement(value: &str) -> Result<f64, RowDecodeError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| RowDecodeError::InvalidNumber {
            value: value.to_string(),
        })
}

/// Decodes one data row into a collection record.
///
/// Fields are decoded in file order and the first failure rejects the row.
///
/// # Errors
///
/// Returns the first field-level failure.
pub fn decode_row(
    record: &StringRecord,
    columns: &ColumnIndex,
    tenant_id: TenantId,
) -> Result<CollectionRecord, RowDecodeError> {
    let collection_date: Date = parse_collection_date(columns.required(record, &COLLECTION_DATE)?)?;

    let auxiliary_raw: &str = columns.required(record, &AUXILIARY_DATE)?;
    let auxiliary_date: AuxiliaryDate =
        AuxiliaryDate::parse(auxiliary_raw).map_err(|_| RowDecodeError::InvalidAuxiliaryDate {
            value: auxiliary_raw.to_string(),
        })?;

    let collection_time: Time = parse_collection_time(columns.required(record, &COLLECTION_TIME)?)?;
    let member_code: MemberCode = MemberCode::new(columns.required(record, &MEMBER_CODE)?);
    let volume_litres: f64 = parse_measurement(columns.required(record, &VOLUME)?)?;
    let fat_percentage: f64 = parse_measurement(columns.required(record, &FAT)?)?;
    let snf: f64 = parse_measurement(columns.required(record, &SNF)?)?;
    let rate: f64 = parse_measurement(columns.required(record, &RATE)?)?;
    let amount: f64 = parse_measurement(columns.required(record, &AMOUNT)?)?;
    let remark: Option<String> = columns.lookup(record, &REMARK).map(str::to_string);

    Ok(CollectionRecord {
        record_id: None,
        tenant_id,
        member_code,
        collection_date,
        auxiliary_date,
        collection_time,
        volume_litres,
        fat_percentage,
        snf,
        rate,
        amount,
        remark,
    })
}

/// Batch importer for milk-analyzer CSV files.
#[derive(Debug, Clone, Copy)]
pub struct CsvIngestionPipeline {
    batch_size: usize,
}

impl Default for CsvIngestionPipeline {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
        }
    }
}

impl CsvIngestionPipeline {
    /// Creates a pipeline that flushes every `batch_size` records (at least one).
    #[must_use]
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Parses `contents` and stores every decodable row for `tenant_id`.
    ///
    /// A file where every row fails still returns a summary.
    ///
    /// # Errors
    ///
    /// Returns `CsvIngestError::EmptyFile` for an empty upload,
    /// `CsvIngestError::Unreadable` if the header cannot be read,
    /// `CsvIngestError::NoRecords` for a header-only file, and
    /// `CsvIngestError::Storage` if a batch cannot be stored. On any error
    /// nothing from the upload remains in the sink.
    pub fn ingest<S>(
        &self,
        contents: &[u8],
        tenant_id: TenantId,
        sink: &mut S,
    ) -> Result<IngestionSummary, CsvIngestError>
    where
        S: CollectionRecordSink + ?Sized,
    {
        if contents.trim_ascii().is_empty() {
            return Err(CsvIngestError::EmptyFile);
        }

        sink.begin().map_err(CsvIngestError::Storage)?;
        match self.ingest_rows(contents, tenant_id, sink) {
            Ok(summary) => {
                sink.commit().map_err(CsvIngestError::Storage)?;
                info!(
                    tenant_id = tenant_id.value(),
                    total = summary.total_records,
                    successful = summary.successful_records,
                    failed = summary.failed_records,
                    "Collection CSV ingestion complete"
                );
                Ok(summary)
            }
            Err(err) => {
                sink.rollback();
                warn!(
                    tenant_id = tenant_id.value(),
                    error = %err,
                    "Collection CSV ingestion aborted; nothing stored"
                );
                Err(err)
            }
        }
    }

    fn ingest_rows<S>(
        &self,
        contents: &[u8],
        tenant_id: TenantId,
        sink: &mut S,
    ) -> Result<IngestionSummary, CsvIngestError>
    where
        S: CollectionRecordSink + ?Sized,
    {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(contents);

        let headers: StringRecord = reader
            .headers()
            .map_err(|e| CsvIngestError::Unreadable {
                reason: format!("Failed to read CSV headers: {e}"),
            })?
            .clone();
        let columns: ColumnIndex = ColumnIndex::from_headers(&headers);

        info!(
            tenant_id = tenant_id.value(),
            columns = headers.len(),
            "Starting collection CSV ingestion"
        );

        let mut summary: IngestionSummary = IngestionSummary::default();
        let mut batch: Vec<CollectionRecord> = Vec::with_capacity(self.batch_size);

        for (idx, result) in reader.records().enumerate() {
            let row_number: usize = idx + 1;
            summary.total_records += 1;

            let decoded: Result<CollectionRecord, RowDecodeError> = result
                .map_err(|e| RowDecodeError::Malformed {
                    reason: e.to_string(),
                })
                .and_then(|record| decode_row(&record, &columns, tenant_id));

            match decoded {
                Ok(record) => {
                    batch.push(record);
                    if batch.len() >= self.batch_size {
                        summary.successful_records += Self::flush(sink, &mut batch)?;
                    }
                }
                Err(err) => {
                    debug!(row_number, error = %err, "Rejected CSV row");
                    summary.errors.push(RowFailure {
                        row_number,
                        message: err.to_string(),
                    });
                }
            }
        }

        if summary.total_records == 0 {
            return Err(CsvIngestError::NoRecords);
        }

        summary.successful_records += Self::flush(sink, &mut batch)?;
        summary.failed_records = summary.errors.len();

        Ok(summary)
    }

    fn flush<S>(sink: &mut S, batch: &mut Vec<CollectionRecord>) -> Result<usize, CsvIngestError>
    where
        S: CollectionRecordSink + ?Sized,
    {
        if batch.is_empty() {
            return Ok(0);
        }

        let size: usize = batch.len();
        sink.insert_batch(batch).map_err(CsvIngestError::Storage)?;
        batch.clear();

        debug!(size, "Flushed collection record batch");
        Ok(size)
    }
}
