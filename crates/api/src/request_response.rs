// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Field names follow the wire contract of the mobile and web clients
//! (`camelCase`, `dairyCenterId`, `dairyGivenId`).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::csv_ingest::{IngestionSummary, RowFailure};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Returns the current UTC time as RFC 3339, or an empty string if it
/// cannot be formatted.
#[must_use]
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

/// Uniform success envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` in a successful envelope.
    #[must_use]
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            timestamp: now_rfc3339(),
        }
    }
}

/// Page selection for list endpoints (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

const fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Clamps the page to `>= 0` and the size to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(0),
            size: self.size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first element on this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of a larger listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> PagedResponse<T> {
    /// Builds page metadata around `content`.
    ///
    /// `page` must already be normalized.
    #[must_use]
    pub fn new(content: Vec<T>, page: PageRequest, total_elements: i64) -> Self {
        let total_pages: i64 = if total_elements == 0 {
            0
        } else {
            (total_elements + page.size - 1) / page.size
        };
        Self {
            empty: content.is_empty(),
            content,
            page: page.page,
            size: page.size,
            total_elements,
            total_pages,
            first: page.page == 0,
            last: page.page + 1 >= total_pages,
        }
    }
}

/// API request to onboard a new dairy center.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OnboardTenantRequest {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub contact: Option<String>,
}

/// A dairy center as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub contact: Option<String>,
    pub is_active: bool,
}

/// API response for a successful onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardTenantResponse {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub contact: Option<String>,
    pub message: String,
}

/// API request to register a farmer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFarmerRequest {
    pub name: String,
    pub phone: String,
    /// The cooperative-issued member code.
    pub dairy_given_id: String,
    pub password: String,
    pub dairy_center_id: i64,
}

/// API response for a registered farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerInfo {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub dairy_given_id: String,
    pub dairy_center_id: i64,
}

/// API request to add a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub dairy_center_id: i64,
}

/// A staff member as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffInfo {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub dairy_center_id: i64,
}

/// API request to log in.
///
/// A non-blank `dairy_given_id` selects a farmer login; otherwise staff.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub dairy_given_id: Option<String>,
    pub dairy_center_id: i64,
}

/// API response for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// The phone number the caller logged in with.
    pub username: String,
    pub name: String,
    pub dairy_center_id: i64,
    pub dairy_center_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dairy_given_id: Option<String>,
    pub role: String,
    pub message: String,
}

/// API request to exchange a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// API response carrying a freshly minted access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub message: String,
}

/// One collection record as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecordInfo {
    pub id: Option<i64>,
    /// `yyyy-MM-dd`.
    pub collection_date: String,
    pub nepali_date: String,
    pub nepali_month: String,
    pub nepali_year: String,
    /// `HH:mm`.
    pub collection_time: String,
    pub member_code: String,
    /// Registered farmer name, `Unknown` when no farmer holds the code.
    pub farmer_name: String,
    pub volume_liters: f64,
    pub fat_percentage: f64,
    pub snf: f64,
    pub rate: f64,
    pub amount: f64,
    pub remarks: Option<String>,
    pub dairy_center_id: i64,
    pub dairy_center_name: String,
}

/// A record listing plus its human-readable summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRecordListResponse {
    pub records: Vec<CollectionRecordInfo>,
    pub message: String,
}

/// API response for a processed CSV upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvUploadResponse {
    pub total_records: usize,
    pub successful_records: usize,
    pub failed_records: usize,
    pub errors: Vec<CsvRowError>,
    #[serde(skip)]
    pub message: String,
}

/// A rejected CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvRowError {
    pub row_number: usize,
    pub error: String,
}

impl From<RowFailure> for CsvRowError {
    fn from(failure: RowFailure) -> Self {
        Self {
            row_number: failure.row_number,
            error: failure.message,
        }
    }
}

impl From<IngestionSummary> for CsvUploadResponse {
    fn from(summary: IngestionSummary) -> Self {
        let message: String = format!(
            "CSV processed: {}/{} records saved successfully",
            summary.successful_records, summary.total_records
        );
        Self {
            total_records: summary.total_records,
            successful_records: summary.successful_records,
            failed_records: summary.failed_records,
            errors: summary.errors.into_iter().map(CsvRowError::from).collect(),
            message,
        }
    }
}
