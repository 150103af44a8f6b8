// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Handlers are synchronous and transport-agnostic: the server crate owns
//! the HTTP framing, bearer-token extraction and status mapping. Every
//! operation that touches principals or collection records runs inside
//! `AccessGuard::enforce`, so it receives its tenant explicitly and never
//! runs without one.

use std::collections::HashMap;

use dairy_domain::{
    CollectionRecord, DomainError, FarmerPrincipal, MemberCode, StaffPrincipal, Tenant, TenantId,
    validate_member_code, validate_person_name, validate_phone, validate_tenant_fields,
};
use dairy_persistence::{Persistence, PersistenceError};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{info, warn};

use crate::auth::{
    AuthenticatedActor, AuthorizationService, CredentialResolver, LoginInput, VerifiedPrincipal,
};
use crate::csv_ingest::{CsvIngestionPipeline, IngestionSummary};
use crate::error::{ApiError, AuthError, translate_domain_error};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    CollectionRecordInfo, CollectionRecordListResponse, CreateStaffRequest, CsvUploadResponse,
    FarmerInfo, LoginRequest, LoginResponse, OnboardTenantRequest, OnboardTenantResponse,
    PageRequest, PagedResponse, RefreshRequest, RefreshResponse, RegisterFarmerRequest, StaffInfo,
    TenantInfo,
};
use crate::tenant_context::{AccessGuard, TenantContext};
use crate::token::{IssuedToken, RefreshIdentity, TokenIssuer};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

/// Farmer name shown for member codes nobody has registered yet.
pub const UNKNOWN_FARMER_NAME: &str = "Unknown";

/// Which login endpoint a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    /// Unified login: a non-blank member code selects a farmer.
    Any,
    /// Farmer login: a member code is mandatory.
    Farmer,
    /// Staff login: any member code is ignored.
    Staff,
}

fn tenant_info(tenant: Tenant) -> TenantInfo {
    TenantInfo {
        id: tenant.tenant_id.value(),
        name: tenant.name,
        location: tenant.location,
        contact: tenant.contact,
        is_active: tenant.is_active,
    }
}

fn staff_info(staff: StaffPrincipal) -> StaffInfo {
    StaffInfo {
        id: staff.staff_id,
        name: staff.name,
        phone: staff.phone,
        dairy_center_id: staff.tenant_id.value(),
    }
}

/// Loads a tenant or fails with `TenantNotFound`.
fn require_tenant(persistence: &mut Persistence, tenant_id: TenantId) -> Result<Tenant, ApiError> {
    persistence
        .get_tenant(tenant_id)?
        .ok_or_else(|| translate_domain_error(DomainError::TenantNotFound(tenant_id)))
}

/// Maps a storage unique violation to the matching duplicate error.
fn map_duplicate(err: PersistenceError, duplicate: impl FnOnce() -> DomainError) -> ApiError {
    match err {
        PersistenceError::UniqueViolation(_) => translate_domain_error(duplicate()),
        other => ApiError::from(other),
    }
}

/// Onboards a new dairy center.
///
/// Name uniqueness (ignoring case) is enforced by storage, so of two
/// concurrent onboardings with the same name exactly one succeeds.
///
/// # Errors
///
/// Returns an error if:
/// - The name or location is blank
/// - A dairy center with the same name exists
/// - Database operations fail
pub fn onboard_tenant(
    persistence: &mut Persistence,
    request: &OnboardTenantRequest,
) -> Result<OnboardTenantResponse, ApiError> {
    validate_tenant_fields(&request.name, &request.location).map_err(translate_domain_error)?;

    let name: &str = request.name.trim();
    let contact: Option<&str> = request
        .contact
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let tenant: Tenant = persistence
        .create_tenant(name, request.location.trim(), contact)
        .map_err(|e| {
            map_duplicate(e, || DomainError::DuplicateTenant {
                name: name.to_string(),
            })
        })?;

    info!(
        tenant_id = tenant.tenant_id.value(),
        name = %tenant.name,
        "Onboarded dairy center"
    );

    Ok(OnboardTenantResponse {
        id: tenant.tenant_id.value(),
        message: format!("Dairy center '{}' onboarded successfully", tenant.name),
        name: tenant.name,
        location: tenant.location,
        contact: tenant.contact,
    })
}

/// Lists dairy centers one page at a time, ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_tenants(
    persistence: &mut Persistence,
    page: PageRequest,
) -> Result<PagedResponse<TenantInfo>, ApiError> {
    let page: PageRequest = page.normalized();
    let (tenants, total): (Vec<Tenant>, i64) =
        persistence.list_tenants(page.offset(), page.size)?;

    Ok(PagedResponse::new(
        tenants.into_iter().map(tenant_info).collect(),
        page,
        total,
    ))
}

/// Returns a single dairy center.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the dairy center does not exist.
pub fn get_tenant(persistence: &mut Persistence, tenant_id: TenantId) -> Result<TenantInfo, ApiError> {
    require_tenant(persistence, tenant_id).map(tenant_info)
}

/// Registers a farmer in the declared dairy center.
///
/// Registration is public; the declared dairy center becomes the request's
/// tenant.
///
/// # Errors
///
/// Returns an error if:
/// - The dairy center does not exist
/// - Name, phone, member code or password fail validation
/// - The `(dairy center, phone, member code)` triple is already registered
/// - Database operations fail
pub fn register_farmer(
    persistence: &mut Persistence,
    request: &RegisterFarmerRequest,
) -> Result<FarmerInfo, ApiError> {
    let mut context: TenantContext =
        TenantContext::with_tenant(TenantId::new(request.dairy_center_id));

    AccessGuard::enforce(&mut context, "register_farmer", |tenant_id| {
        require_tenant(persistence, tenant_id)?;

        let phone: &str = request.phone.trim();
        let member_code: MemberCode = MemberCode::new(&request.dairy_given_id);
        validate_person_name(&request.name).map_err(translate_domain_error)?;
        validate_phone(phone).map_err(translate_domain_error)?;
        validate_member_code(&member_code).map_err(translate_domain_error)?;
        PasswordPolicy::default().validate(&request.password, phone)?;

        let farmer: FarmerPrincipal = persistence
            .create_farmer(
                tenant_id,
                request.name.trim(),
                phone,
                &member_code,
                &request.password,
            )
            .map_err(|e| {
                map_duplicate(e, || DomainError::DuplicateFarmer {
                    tenant_id,
                    phone: phone.to_string(),
                    member_code: member_code.value().to_string(),
                })
            })?;

        info!(
            tenant_id = tenant_id.value(),
            farmer_id = farmer.farmer_id,
            member_code = %farmer.member_code,
            "Registered farmer"
        );

        Ok(FarmerInfo {
            id: farmer.farmer_id,
            name: farmer.name,
            phone: farmer.phone,
            dairy_given_id: farmer.member_code.value().to_string(),
            dairy_center_id: tenant_id.value(),
        })
    })
}

/// Adds a staff member to the declared dairy center.
///
/// The first staff member of a dairy center may be created without a token.
/// Once a dairy center has staff, only its own staff may add more.
///
/// # Errors
///
/// Returns an error if:
/// - The dairy center does not exist
/// - Staff exist and the caller is unauthenticated, not staff, or staff of
///   another dairy center
/// - Name, phone or password fail validation
/// - The `(dairy center, phone)` pair is already registered
/// - Database operations fail
pub fn create_staff(
    persistence: &mut Persistence,
    request: &CreateStaffRequest,
    actor: Option<&AuthenticatedActor>,
) -> Result<StaffInfo, ApiError> {
    let mut context: TenantContext =
        TenantContext::with_tenant(TenantId::new(request.dairy_center_id));

    AccessGuard::enforce(&mut context, "create_staff", |tenant_id| {
        require_tenant(persistence, tenant_id)?;

        let (_, existing_staff): (Vec<StaffPrincipal>, i64) =
            persistence.list_staff(tenant_id, 0, 1)?;
        if existing_staff > 0 {
            let actor: &AuthenticatedActor = actor.ok_or_else(|| ApiError::AuthenticationFailed {
                reason: String::from("Authentication required to add staff"),
            })?;
            AuthorizationService::authorize_create_staff(actor)?;
            if actor.tenant_id != tenant_id {
                warn!(
                    actor_tenant = actor.tenant_id.value(),
                    tenant_id = tenant_id.value(),
                    "Refusing cross-tenant staff creation"
                );
                return Err(ApiError::Unauthorized {
                    action: String::from("create_staff"),
                    required_role: String::from("ROLE_DAIRY_STAFF of the same dairy center"),
                });
            }
        }

        let phone: &str = request.phone.trim();
        validate_person_name(&request.name).map_err(translate_domain_error)?;
        validate_phone(phone).map_err(translate_domain_error)?;
        PasswordPolicy::default().validate(&request.password, phone)?;

        let staff: StaffPrincipal = persistence
            .create_staff(tenant_id, request.name.trim(), phone, &request.password)
            .map_err(|e| {
                map_duplicate(e, || DomainError::DuplicateStaff {
                    tenant_id,
                    phone: phone.to_string(),
                })
            })?;

        info!(
            tenant_id = tenant_id.value(),
            staff_id = staff.staff_id,
            bootstrap = existing_staff == 0,
            "Created staff member"
        );

        Ok(staff_info(staff))
    })
}

/// Lists the staff of the caller's dairy center.
///
/// # Errors
///
/// Returns an error if the caller is not staff, the context holds no
/// tenant, or the query fails.
pub fn list_staff(
    persistence: &mut Persistence,
    context: &mut TenantContext,
    actor: &AuthenticatedActor,
    page: PageRequest,
) -> Result<PagedResponse<StaffInfo>, ApiError> {
    AuthorizationService::authorize_list_staff(actor).inspect_err(|_| context.clear())?;
    let page: PageRequest = page.normalized();

    AccessGuard::enforce(context, "list_staff", |tenant_id| {
        let (staff, total): (Vec<StaffPrincipal>, i64) =
            persistence.list_staff(tenant_id, page.offset(), page.size)?;
        Ok(PagedResponse::new(
            staff.into_iter().map(staff_info).collect(),
            page,
            total,
        ))
    })
}

/// Authenticates a farmer or staff member and issues a token pair.
///
/// # Errors
///
/// Returns an error if:
/// - A farmer login carries no member code
/// - No principal matches or the password is wrong (one generic error)
/// - Token signing or database operations fail
pub fn login(
    persistence: &mut Persistence,
    issuer: &TokenIssuer,
    request: &LoginRequest,
    kind: LoginKind,
) -> Result<LoginResponse, ApiError> {
    let member_code: Option<&str> = match kind {
        LoginKind::Staff => None,
        LoginKind::Any => request.dairy_given_id.as_deref(),
        LoginKind::Farmer => Some(
            request
                .dairy_given_id
                .as_deref()
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .ok_or_else(|| ApiError::InvalidInput {
                    field: String::from("dairyGivenId"),
                    message: String::from("Member code is required for farmer login"),
                })?,
        ),
    };

    let mut context: TenantContext =
        TenantContext::with_tenant(TenantId::new(request.dairy_center_id));

    AccessGuard::enforce(&mut context, "login", |tenant_id| {
        let input: LoginInput<'_> = LoginInput {
            tenant_id,
            phone: request.phone.trim(),
            password: &request.password,
            member_code,
        };
        let principal: VerifiedPrincipal = CredentialResolver::resolve(persistence, &input)?;

        let tenant: Tenant = persistence
            .get_tenant(tenant_id)?
            .ok_or_else(|| ApiError::Internal {
                message: format!("Dairy center {tenant_id} missing for an existing principal"),
            })?;

        let actor: AuthenticatedActor = principal.to_actor();
        let access: IssuedToken = issuer.issue_access(&actor)?;
        let refresh: IssuedToken = issuer.issue_refresh(&actor)?;

        Ok(LoginResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: String::from("Bearer"),
            expires_in: access.expires_in,
            username: actor.phone.clone(),
            name: principal.name().to_string(),
            dairy_center_id: tenant_id.value(),
            dairy_center_name: tenant.name,
            dairy_given_id: actor.member_code.as_ref().map(|c| c.value().to_string()),
            role: actor.role.as_claim().to_string(),
            message: String::from("Login successful"),
        })
    })
}

/// Exchanges a refresh token for a new access token.
///
/// The principal is re-loaded from storage, so a deleted principal cannot
/// refresh.
///
/// # Errors
///
/// Returns an error if the token is not a valid refresh token or the
/// principal no longer exists.
pub fn refresh(
    persistence: &mut Persistence,
    issuer: &TokenIssuer,
    request: &RefreshRequest,
) -> Result<RefreshResponse, ApiError> {
    let identity: RefreshIdentity = issuer.verify_refresh(&request.refresh_token)?;
    let mut context: TenantContext = TenantContext::with_tenant(identity.tenant_id);

    AccessGuard::enforce(&mut context, "refresh", |tenant_id| {
        let principal: VerifiedPrincipal = CredentialResolver::reload(
            persistence,
            tenant_id,
            &identity.phone,
            identity.member_code.as_ref(),
        )?;
        let access: IssuedToken = issuer.issue_access(&principal.to_actor())?;

        info!(
            tenant_id = tenant_id.value(),
            role = %principal.role(),
            "Refreshed access token"
        );

        Ok(RefreshResponse {
            access_token: access.token,
            token_type: String::from("Bearer"),
            expires_in: access.expires_in,
            message: String::from("Token refreshed"),
        })
    })
}

/// Refuses a request whose declared dairy center differs from the one in
/// its context. The context is cleared on refusal.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` on a mismatch.
pub fn ensure_declared_tenant(
    context: &mut TenantContext,
    declared_tenant: Option<TenantId>,
    action: &str,
) -> Result<(), ApiError> {
    let Some(declared) = declared_tenant.filter(|declared| Some(*declared) != context.get()) else {
        return Ok(());
    };

    warn!(
        declared = declared.value(),
        context_tenant = ?context.get().map(|t| t.value()),
        action,
        "Refusing request for another dairy center"
    );
    context.clear();
    Err(ApiError::Unauthorized {
        action: action.to_string(),
        required_role: String::from("member of the declared dairy center"),
    })
}

/// Ingests a milk-analyzer CSV export into the caller's dairy center.
///
/// A declared dairy center different from the caller's is refused. Rows
/// that fail to decode are reported, not raised.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not staff, or declares another dairy center
/// - The dairy center does not exist
/// - The file is empty, unreadable or has no data rows
/// - A batch cannot be stored
pub fn upload_collection_csv(
    persistence: &mut Persistence,
    context: &mut TenantContext,
    actor: &AuthenticatedActor,
    declared_tenant: Option<TenantId>,
    contents: &[u8],
) -> Result<CsvUploadResponse, ApiError> {
    AuthorizationService::authorize_upload_collection(actor).inspect_err(|_| context.clear())?;
    ensure_declared_tenant(context, declared_tenant, "upload_collection")?;

    AccessGuard::enforce(context, "upload_collection", |tenant_id| {
        require_tenant(persistence, tenant_id)?;
        let summary: IngestionSummary =
            CsvIngestionPipeline::default().ingest(contents, tenant_id, persistence)?;
        Ok(CsvUploadResponse::from(summary))
    })
}

/// Converts stored records to API records enriched with farmer and dairy
/// center names.
fn enrich_records(
    persistence: &mut Persistence,
    tenant: &Tenant,
    records: Vec<CollectionRecord>,
) -> Result<Vec<CollectionRecordInfo>, ApiError> {
    let names: HashMap<String, String> = persistence.farmer_names_by_member_code(tenant.tenant_id)?;

    records
        .into_iter()
        .map(|record| {
            let collection_date: String =
                record
                    .collection_date
                    .format(DATE_FORMAT)
                    .map_err(|e| ApiError::Internal {
                        message: format!("Failed to format collection date: {e}"),
                    })?;
            let collection_time: String =
                record
                    .collection_time
                    .format(TIME_FORMAT)
                    .map_err(|e| ApiError::Internal {
                        message: format!("Failed to format collection time: {e}"),
                    })?;
            let farmer_name: String = names
                .get(record.member_code.value())
                .cloned()
                .unwrap_or_else(|| String::from(UNKNOWN_FARMER_NAME));

            Ok(CollectionRecordInfo {
                id: record.record_id,
                collection_date,
                nepali_date: record.auxiliary_date.raw().to_string(),
                nepali_month: record.auxiliary_date.month().to_string(),
                nepali_year: record.auxiliary_date.year().to_string(),
                collection_time,
                member_code: record.member_code.value().to_string(),
                farmer_name,
                volume_liters: record.volume_litres,
                fat_percentage: record.fat_percentage,
                snf: record.snf,
                rate: record.rate,
                amount: record.amount,
                remarks: record.remark,
                dairy_center_id: tenant.tenant_id.value(),
                dairy_center_name: tenant.name.clone(),
            })
        })
        .collect()
}

/// Returns one member's records for an auxiliary-calendar month.
///
/// # Errors
///
/// Returns an error if a farmer asks for another member code, the context
/// holds no tenant, or the query fails.
pub fn farmer_monthly_records(
    persistence: &mut Persistence,
    context: &mut TenantContext,
    actor: &AuthenticatedActor,
    member_code: &MemberCode,
    month: &str,
    year: &str,
) -> Result<CollectionRecordListResponse, ApiError> {
    AuthorizationService::authorize_view_member_records(actor, member_code)
        .inspect_err(|_| context.clear())?;

    AccessGuard::enforce(context, "farmer_monthly_records", |tenant_id| {
        let tenant: Tenant = require_tenant(persistence, tenant_id)?;
        let stored: Vec<CollectionRecord> = persistence.list_member_monthly_records(
            tenant_id,
            member_code,
            month.trim(),
            year.trim(),
        )?;
        let records: Vec<CollectionRecordInfo> = enrich_records(persistence, &tenant, stored)?;

        let message: String = if records.is_empty() {
            format!("No records found for farmer {member_code} in {month}/{year}")
        } else {
            String::from("Monthly records retrieved")
        };
        Ok(CollectionRecordListResponse { records, message })
    })
}

/// Returns every record for one member.
///
/// # Errors
///
/// Returns an error if a farmer asks for another member code, the context
/// holds no tenant, or the query fails.
pub fn farmer_records(
    persistence: &mut Persistence,
    context: &mut TenantContext,
    actor: &AuthenticatedActor,
    member_code: &MemberCode,
) -> Result<CollectionRecordListResponse, ApiError> {
    AuthorizationService::authorize_view_member_records(actor, member_code)
        .inspect_err(|_| context.clear())?;

    AccessGuard::enforce(context, "farmer_records", |tenant_id| {
        let tenant: Tenant = require_tenant(persistence, tenant_id)?;
        let stored: Vec<CollectionRecord> = persistence.list_member_records(tenant_id, member_code)?;
        let records: Vec<CollectionRecordInfo> = enrich_records(persistence, &tenant, stored)?;

        let message: String = if records.is_empty() {
            format!("No records found for farmer {member_code}")
        } else {
            String::from("Records retrieved")
        };
        Ok(CollectionRecordListResponse { records, message })
    })
}

/// Returns every record of the caller's dairy center for an
/// auxiliary-calendar month.
///
/// # Errors
///
/// Returns an error if the caller is not staff, the context holds no
/// tenant, or the query fails.
pub fn dairy_monthly_records(
    persistence: &mut Persistence,
    context: &mut TenantContext,
    actor: &AuthenticatedActor,
    month: &str,
    year: &str,
) -> Result<CollectionRecordListResponse, ApiError> {
    AuthorizationService::authorize_view_dairy_records(actor).inspect_err(|_| context.clear())?;

    AccessGuard::enforce(context, "dairy_monthly_records", |tenant_id| {
        let tenant: Tenant = require_tenant(persistence, tenant_id)?;
        let stored: Vec<CollectionRecord> =
            persistence.list_tenant_monthly_records(tenant_id, month.trim(), year.trim())?;
        let records: Vec<CollectionRecordInfo> = enrich_records(persistence, &tenant, stored)?;

        let message: String = if records.is_empty() {
            format!("No records found for {month}/{year}")
        } else {
            String::from("Dairy monthly records retrieved")
        };
        Ok(CollectionRecordListResponse { records, message })
    })
}

/// Verifies an access token and builds the request's tenant context.
///
/// # Errors
///
/// Returns an error if the token is missing, expired, invalid or not an
/// access token.
pub fn authenticate_request(
    issuer: &TokenIssuer,
    token: &str,
) -> Result<(AuthenticatedActor, TenantContext), AuthError> {
    let actor: AuthenticatedActor = issuer.verify_access(token)?;
    let context: TenantContext = TenantContext::with_tenant(actor.tenant_id);
    Ok((actor, context))
}
