// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API layer for the dairy collection back-office.
//!
//! This crate holds everything between the HTTP transport and storage:
//! tenant context enforcement, dual-actor credential resolution, token
//! issuance, CSV ingestion, and the request/response contract.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod csv_ingest;
mod error;
mod handlers;
mod password_policy;
mod request_response;
mod tenant_context;
mod token;

#[cfg(test)]
mod tests;

pub use auth::{
    AuthenticatedActor, AuthorizationService, BcryptVerifier, CredentialResolver, LoginInput,
    PasswordVerifier, Role, VerifiedPrincipal,
};
pub use csv_ingest::{
    BATCH_SIZE, CollectionRecordSink, ColumnIndex, CsvIngestError, CsvIngestionPipeline,
    IngestionSummary, RowDecodeError, RowFailure, decode_row, parse_collection_date,
    parse_collection_time, parse_measurement,
};
pub use error::{ApiError, AuthError, translate_domain_error};
pub use handlers::{
    LoginKind, UNKNOWN_FARMER_NAME, authenticate_request, create_staff, dairy_monthly_records,
    ensure_declared_tenant, farmer_monthly_records, farmer_records, get_tenant, list_staff,
    list_tenants, login, onboard_tenant, refresh, register_farmer, upload_collection_csv,
};
pub use password_policy::{DEFAULT_MIN_PASSWORD_LENGTH, PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    ApiResponse, CollectionRecordInfo, CollectionRecordListResponse, CreateStaffRequest,
    CsvRowError, CsvUploadResponse, DEFAULT_PAGE_SIZE, FarmerInfo, LoginRequest, LoginResponse,
    MAX_PAGE_SIZE, OnboardTenantRequest, OnboardTenantResponse, PageRequest, PagedResponse,
    RefreshRequest, RefreshResponse, RegisterFarmerRequest, StaffInfo, TenantInfo, now_rfc3339,
};
pub use tenant_context::{AccessGuard, TenantContext};
pub use token::{
    IssuedToken, MIN_SECRET_LENGTH, RefreshIdentity, TokenClaims, TokenClass, TokenConfig,
    TokenConfigError, TokenIssuer,
};
