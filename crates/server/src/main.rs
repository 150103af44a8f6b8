// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod session;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use dairy_api::{
    ApiError, ApiResponse, CollectionRecordInfo, CollectionRecordListResponse, CreateStaffRequest,
    CsvUploadResponse, FarmerInfo, LoginKind, LoginRequest, LoginResponse, OnboardTenantRequest,
    OnboardTenantResponse, PageRequest, PagedResponse, RefreshRequest, RefreshResponse,
    RegisterFarmerRequest, StaffInfo, TenantInfo, TokenConfig, TokenIssuer, create_staff,
    dairy_monthly_records, ensure_declared_tenant, farmer_monthly_records, farmer_records,
    get_tenant, list_staff, list_tenants, login, now_rfc3339, onboard_tenant, refresh,
    register_farmer, upload_collection_csv,
};
use dairy_domain::{MemberCode, TenantId};
use dairy_persistence::Persistence;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::session::{OptionalSessionActor, SessionActor};

/// Default upload limit: 20 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Dairy collection server - HTTP back-office for dairy cooperatives
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "DAIRY_DATABASE")]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, env = "DAIRY_BIND", default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to bind the server to
    #[arg(short, long, env = "DAIRY_PORT", default_value_t = 3000)]
    port: u16,

    /// HS512 signing secret, at least 64 bytes
    #[arg(long, env = "DAIRY_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Access token lifetime in minutes
    #[arg(long, env = "DAIRY_ACCESS_TOKEN_TTL_MINUTES", default_value_t = 60)]
    access_token_ttl_minutes: i64,

    /// Refresh token lifetime in days
    #[arg(long, env = "DAIRY_REFRESH_TOKEN_TTL_DAYS", default_value_t = 7)]
    refresh_token_ttl_days: i64,

    /// Largest accepted CSV upload, in bytes
    #[arg(long, env = "DAIRY_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// bcrypt work factor for new passwords
    #[arg(long, env = "DAIRY_BCRYPT_COST")]
    bcrypt_cost: Option<u32>,
}

/// Application state shared across handlers.
///
/// The persistence layer is wrapped in a Mutex to allow safe concurrent
/// access. Tenant context is never stored here; each request builds its own.
#[derive(Clone)]
struct AppState {
    /// The persistence layer.
    persistence: Arc<Mutex<Persistence>>,
    /// Signs and verifies access and refresh tokens.
    token_issuer: Arc<TokenIssuer>,
}

/// Query parameters for monthly record listings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonthlyRecordsQuery {
    /// Auxiliary-calendar month, as it appears in uploaded files.
    nepali_month: String,
    /// Auxiliary-calendar year.
    nepali_year: String,
    /// Optional declared dairy center; must match the token's.
    #[serde(default)]
    dairy_center_id: Option<i64>,
}

/// Optional declared dairy center.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DairyCenterQuery {
    #[serde(default)]
    dairy_center_id: Option<i64>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    /// Always `false`.
    success: bool,
    /// Error message.
    message: String,
    /// RFC 3339 time the error was produced.
    timestamp: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            success: false,
            message: self.message,
            timestamp: now_rfc3339(),
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthenticationFailed { .. } => {
                Self::new(StatusCode::UNAUTHORIZED, err.to_string())
            }
            ApiError::Unauthorized { .. } => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            ApiError::DomainRuleViolation { .. } => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            ApiError::ResourceNotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ApiError::InvalidInput { .. }
            | ApiError::InvalidCsvFormat { .. }
            | ApiError::PasswordPolicyViolation { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Internal { message } => {
                error!(error = %message, "Internal error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Handler for POST `/api/dairy/onboard`.
async fn handle_onboard_tenant(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<OnboardTenantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OnboardTenantResponse>>), HttpError> {
    info!(name = %req.name, "Handling onboard_tenant request");

    let mut persistence = app_state.persistence.lock().await;
    let response: OnboardTenantResponse = onboard_tenant(&mut persistence, &req)?;
    drop(persistence);

    let message: String = response.message.clone();
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response, message))))
}

/// Handler for GET `/api/dairy/centers`.
async fn handle_list_tenants(
    AxumState(app_state): AxumState<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PagedResponse<TenantInfo>>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: PagedResponse<TenantInfo> = list_tenants(&mut persistence, page)?;
    Ok(Json(ApiResponse::ok(response, "Dairy centers retrieved")))
}

/// Handler for GET `/api/dairy/centers/{id}`.
async fn handle_get_tenant(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant_id): Path<i64>,
) -> Result<Json<ApiResponse<TenantInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: TenantInfo = get_tenant(&mut persistence, TenantId::new(tenant_id))?;
    Ok(Json(ApiResponse::ok(response, "Dairy center retrieved")))
}

/// Handler for POST `/api/farmer/register`.
async fn handle_register_farmer(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterFarmerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FarmerInfo>>), HttpError> {
    info!(
        dairy_center_id = req.dairy_center_id,
        "Handling register_farmer request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: FarmerInfo = register_farmer(&mut persistence, &req)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(response, "Farmer registered successfully")),
    ))
}

/// Handler for POST `/api/staff/create`.
///
/// The first staff member of a dairy center needs no token.
async fn handle_create_staff(
    AxumState(app_state): AxumState<AppState>,
    OptionalSessionActor(actor): OptionalSessionActor,
    Json(req): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StaffInfo>>), HttpError> {
    info!(
        dairy_center_id = req.dairy_center_id,
        authenticated = actor.is_some(),
        "Handling create_staff request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: StaffInfo = create_staff(&mut persistence, &req, actor.as_ref())?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(response, "Staff account created successfully")),
    ))
}

/// Handler for GET `/api/staff/dairy/{dairyCenterId}`.
async fn handle_list_staff(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, mut context): SessionActor,
    Path(dairy_center_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PagedResponse<StaffInfo>>>, HttpError> {
    ensure_declared_tenant(
        &mut context,
        Some(TenantId::new(dairy_center_id)),
        "list_staff",
    )?;

    let mut persistence = app_state.persistence.lock().await;
    let response: PagedResponse<StaffInfo> =
        list_staff(&mut persistence, &mut context, &actor, page)?;
    Ok(Json(ApiResponse::ok(response, "Staff members retrieved")))
}

async fn login_with(
    app_state: &AppState,
    req: &LoginRequest,
    kind: LoginKind,
) -> Result<Json<ApiResponse<LoginResponse>>, HttpError> {
    info!(
        dairy_center_id = req.dairy_center_id,
        kind = ?kind,
        "Handling login request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = login(&mut persistence, &app_state.token_issuer, req, kind)?;
    let message: String = response.message.clone();
    Ok(Json(ApiResponse::ok(response, message)))
}

/// Handler for POST `/api/auth/login`.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, HttpError> {
    login_with(&app_state, &req, LoginKind::Any).await
}

/// Handler for POST `/api/farmer/login`.
async fn handle_farmer_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, HttpError> {
    login_with(&app_state, &req, LoginKind::Farmer).await
}

/// Handler for POST `/api/staff/login`.
async fn handle_staff_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, HttpError> {
    login_with(&app_state, &req, LoginKind::Staff).await
}

/// Handler for POST `/api/auth/refresh`.
async fn handle_refresh(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: RefreshResponse = refresh(&mut persistence, &app_state.token_issuer, &req)?;
    let message: String = response.message.clone();
    Ok(Json(ApiResponse::ok(response, message)))
}

/// Handler for POST `/api/milk/upload`.
///
/// Multipart fields: `file` (required) and `dairyCenterId` (optional).
async fn handle_upload_collection(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, mut context): SessionActor,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<CsvUploadResponse>>, HttpError> {
    let mut contents: Option<Vec<u8>> = None;
    let mut declared_tenant: Option<TenantId> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Malformed multipart upload");
        HttpError::new(StatusCode::BAD_REQUEST, format!("Malformed upload: {e}"))
    })? {
        let name: Option<String> = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| {
                    HttpError::new(StatusCode::BAD_REQUEST, format!("Failed to read file: {e}"))
                })?;
                contents = Some(bytes.to_vec());
            }
            Some("dairyCenterId") => {
                let text: String = field.text().await.map_err(|e| {
                    HttpError::new(StatusCode::BAD_REQUEST, format!("Malformed upload: {e}"))
                })?;
                let id: i64 = text.trim().parse().map_err(|_| {
                    HttpError::from(ApiError::InvalidInput {
                        field: String::from("dairyCenterId"),
                        message: format!("Not a dairy center id: {text}"),
                    })
                })?;
                declared_tenant = Some(TenantId::new(id));
            }
            _ => {}
        }
    }

    let contents: Vec<u8> = contents.ok_or_else(|| ApiError::InvalidInput {
        field: String::from("file"),
        message: String::from("Please select a CSV file to upload"),
    })?;

    info!(
        tenant_id = actor.tenant_id.value(),
        size = contents.len(),
        "Handling collection CSV upload"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: CsvUploadResponse = upload_collection_csv(
        &mut persistence,
        &mut context,
        &actor,
        declared_tenant,
        &contents,
    )?;
    drop(persistence);

    let message: String = response.message.clone();
    Ok(Json(ApiResponse::ok(response, message)))
}

fn record_list(response: CollectionRecordListResponse) -> Json<ApiResponse<Vec<CollectionRecordInfo>>> {
    Json(ApiResponse::ok(response.records, response.message))
}

/// Handler for GET `/api/milk/farmer/{memberCode}/month`.
async fn handle_farmer_monthly_records(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, mut context): SessionActor,
    Path(member_code): Path<String>,
    Query(query): Query<MonthlyRecordsQuery>,
) -> Result<Json<ApiResponse<Vec<CollectionRecordInfo>>>, HttpError> {
    ensure_declared_tenant(
        &mut context,
        query.dairy_center_id.map(TenantId::new),
        "farmer_monthly_records",
    )?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CollectionRecordListResponse = farmer_monthly_records(
        &mut persistence,
        &mut context,
        &actor,
        &MemberCode::new(&member_code),
        &query.nepali_month,
        &query.nepali_year,
    )?;
    Ok(record_list(response))
}

/// Handler for GET `/api/milk/farmer/{memberCode}`.
async fn handle_farmer_records(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, mut context): SessionActor,
    Path(member_code): Path<String>,
    Query(query): Query<DairyCenterQuery>,
) -> Result<Json<ApiResponse<Vec<CollectionRecordInfo>>>, HttpError> {
    ensure_declared_tenant(
        &mut context,
        query.dairy_center_id.map(TenantId::new),
        "farmer_records",
    )?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CollectionRecordListResponse = farmer_records(
        &mut persistence,
        &mut context,
        &actor,
        &MemberCode::new(&member_code),
    )?;
    Ok(record_list(response))
}

/// Handler for GET `/api/milk/dairy/month`.
async fn handle_dairy_monthly_records(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, mut context): SessionActor,
    Query(query): Query<MonthlyRecordsQuery>,
) -> Result<Json<ApiResponse<Vec<CollectionRecordInfo>>>, HttpError> {
    ensure_declared_tenant(
        &mut context,
        query.dairy_center_id.map(TenantId::new),
        "dairy_monthly_records",
    )?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CollectionRecordListResponse = dairy_monthly_records(
        &mut persistence,
        &mut context,
        &actor,
        &query.nepali_month,
        &query.nepali_year,
    )?;
    Ok(record_list(response))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/dairy/onboard", post(handle_onboard_tenant))
        .route("/api/dairy/centers", get(handle_list_tenants))
        .route("/api/dairy/centers/{id}", get(handle_get_tenant))
        .route("/api/farmer/register", post(handle_register_farmer))
        .route("/api/farmer/login", post(handle_farmer_login))
        .route("/api/staff/create", post(handle_create_staff))
        .route("/api/staff/login", post(handle_staff_login))
        .route("/api/staff/dairy/{dairy_center_id}", get(handle_list_staff))
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/refresh", post(handle_refresh))
        .route(
            "/api/milk/upload",
            post(handle_upload_collection).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/milk/farmer/{member_code}", get(handle_farmer_records))
        .route(
            "/api/milk/farmer/{member_code}/month",
            get(handle_farmer_monthly_records),
        )
        .route("/api/milk/dairy/month", get(handle_dairy_monthly_records))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing dairy collection server");

    let token_config: TokenConfig = TokenConfig::new(
        args.jwt_secret.as_bytes(),
        Duration::minutes(args.access_token_ttl_minutes),
        Duration::days(args.refresh_token_ttl_days),
    )?;

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let mut persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };
    if let Some(cost) = args.bcrypt_cost {
        persistence = persistence.with_bcrypt_cost(cost);
    }
    // The first refused login must not pay for generating the decoy hash.
    persistence.decoy_password_hash()?;

    let token_issuer: TokenIssuer = TokenIssuer::new(token_config);
    info!(
        access_ttl = %token_issuer.config().access_ttl(),
        refresh_ttl = %token_issuer.config().refresh_ttl(),
        "Token issuer ready"
    );

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        token_issuer: Arc::new(token_issuer),
    };

    let app: Router = build_router(app_state, args.max_upload_bytes);

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use dairy_persistence::MIN_BCRYPT_COST;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const TEST_SECRET: &[u8] =
        b"dairy-server-test-secret-that-is-long-enough-for-hs512-signing-key";
    const STAFF_PHONE: &str = "9800000001";
    const FARMER_PHONE: &str = "9812345678";
    const PASSWORD: &str = "milk-secret";
    const BOUNDARY: &str = "dairy-upload-boundary";

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: Persistence = Persistence::new_in_memory()
            .expect("Failed to create in-memory persistence")
            .with_bcrypt_cost(MIN_BCRYPT_COST);
        let config: TokenConfig =
            TokenConfig::new(TEST_SECRET, Duration::minutes(60), Duration::days(7)).unwrap();
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            token_issuer: Arc::new(TokenIssuer::new(config)),
        }
    }

    fn create_test_app() -> Router {
        build_router(create_test_app_state(), DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn json_request(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn upload_request(token: &str, dairy_center_id: Option<i64>, csv: &str) -> Request<Body> {
        let mut body: String = String::new();
        if let Some(id) = dairy_center_id {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"dairyCenterId\"\r\n\r\n{id}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"records.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{BOUNDARY}--\r\n"
        ));

        Request::builder()
            .method("POST")
            .uri("/api/milk/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status: StatusCode = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn onboard(app: &Router, name: &str) -> i64 {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/dairy/onboard",
                &json!({ "name": name, "location": "Chitwan" }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    /// Creates the first staff member of a dairy center and logs them in.
    async fn staff_token(app: &Router, dairy_center_id: i64) -> String {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/staff/create",
                &json!({
                    "name": "Sita Staff",
                    "phone": STAFF_PHONE,
                    "password": PASSWORD,
                    "dairyCenterId": dairy_center_id,
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/staff/login",
                &json!({
                    "phone": STAFF_PHONE,
                    "password": PASSWORD,
                    "dairyCenterId": dairy_center_id,
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["accessToken"].as_str().unwrap().to_string()
    }

    /// Registers a farmer and returns their login response data.
    async fn farmer_login(app: &Router, dairy_center_id: i64, member_code: &str) -> Value {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/farmer/register",
                &json!({
                    "name": "Ram Farmer",
                    "phone": FARMER_PHONE,
                    "dairyGivenId": member_code,
                    "password": PASSWORD,
                    "dairyCenterId": dairy_center_id,
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/farmer/login",
                &json!({
                    "phone": FARMER_PHONE,
                    "password": PASSWORD,
                    "dairyGivenId": member_code,
                    "dairyCenterId": dairy_center_id,
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"].clone()
    }

    fn sample_csv() -> String {
        [
            "Coll_date,Ne_date,Coll_time,Mem_code,Volume_lt,Fat_per,Snf,Rate,Amount,Remark",
            "2025-10-01,01/06/2082,06:30,M001,10.5,4.2,8.5,65.0,682.5,",
            "10/01/2025,01/06/2082,17:45,M001,8.0,4.0,8.4,64.0,512.0,evening",
            "2025-10-02,02/06/2082,06:30,M002,12.0,4.5,8.6,66.0,792.0,",
            "2025-10-03,03/07/2082,06:30,M001,9.0,4.1,8.5,65.0,585.0,",
            "not-a-date,04/06/2082,06:30,M003,9.0,4.1,8.5,65.0,585.0,",
        ]
        .join("\n")
    }

    #[tokio::test]
    async fn test_onboard_and_list_dairy_centers() {
        let app: Router = create_test_app();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/dairy/onboard",
                &json!({ "name": "Bharatpur Dairy", "location": "Chitwan", "contact": "056-520000" }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Bharatpur Dairy");
        assert!(body["timestamp"].is_string());

        let (status, body) = send(&app, get_request("/api/dairy/centers?page=0&size=5", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalElements"], 1);
        assert_eq!(body["data"]["content"][0]["isActive"], true);
        assert_eq!(body["data"]["size"], 5);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_onboarding_admits_one() {
        let app: Router = create_test_app();
        let payload: Value = json!({ "name": "Ratnanagar Dairy", "location": "Chitwan" });

        let (first, second) = futures::join!(
            send(&app, json_request("POST", "/api/dairy/onboard", &payload, None)),
            send(&app, json_request("POST", "/api/dairy/onboard", &payload, None)),
        );

        let mut statuses: Vec<StatusCode> = vec![first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

        let (_, body) = send(&app, get_request("/api/dairy/centers", None)).await;
        assert_eq!(body["data"]["totalElements"], 1);
    }

    #[tokio::test]
    async fn test_get_missing_dairy_center_is_not_found() {
        let app: Router = create_test_app();

        let (status, body) = send(&app, get_request("/api/dairy/centers/999", None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_wrong_password_is_generic_unauthorized() {
        let app: Router = create_test_app();
        let dairy_center_id: i64 = onboard(&app, "Bharatpur Dairy").await;
        staff_token(&app, dairy_center_id).await;

        let (wrong_password, wrong_body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                &json!({ "phone": STAFF_PHONE, "password": "not-it", "dairyCenterId": dairy_center_id }),
                None,
            ),
        )
        .await;
        let (unknown_phone, unknown_body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                &json!({ "phone": "9811111111", "password": PASSWORD, "dairyCenterId": dairy_center_id }),
                None,
            ),
        )
        .await;

        assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_phone, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body["message"], unknown_body["message"]);
    }

    #[tokio::test]
    async fn test_missing_bearer_token_is_unauthorized() {
        let app: Router = create_test_app();

        let (status, body) = send(&app, get_request("/api/milk/dairy/month?nepaliMonth=06&nepaliYear=2082", None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Missing Authorization header");
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_a_bearer_token() {
        let app: Router = create_test_app();
        let dairy_center_id: i64 = onboard(&app, "Bharatpur Dairy").await;
        let login: Value = farmer_login(&app, dairy_center_id, "M001").await;
        let refresh_token: &str = login["refreshToken"].as_str().unwrap();

        let (status, _) = send(&app, get_request("/api/milk/farmer/M001", Some(refresh_token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_issues_usable_access_token() {
        let app: Router = create_test_app();
        let dairy_center_id: i64 = onboard(&app, "Bharatpur Dairy").await;
        let login: Value = farmer_login(&app, dairy_center_id, "M001").await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/refresh",
                &json!({ "refreshToken": login["refreshToken"] }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let access_token: &str = body["data"]["accessToken"].as_str().unwrap();

        let (status, body) = send(&app, get_request("/api/milk/farmer/M001", Some(access_token))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_second_staff_requires_staff_token() {
        let app: Router = create_test_app();
        let dairy_center_id: i64 = onboard(&app, "Bharatpur Dairy").await;
        let token: String = staff_token(&app, dairy_center_id).await;
        let second: Value = json!({
            "name": "Gita Staff",
            "phone": "9800000002",
            "password": PASSWORD,
            "dairyCenterId": dairy_center_id,
        });

        let (anonymous, _) = send(&app, json_request("POST", "/api/staff/create", &second, None)).await;
        let (authorized, body) =
            send(&app, json_request("POST", "/api/staff/create", &second, Some(&token))).await;

        assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
        assert_eq!(authorized, StatusCode::CREATED, "{body}");

        let uri: String = format!("/api/staff/dairy/{dairy_center_id}");
        let (status, body) = send(&app, get_request(&uri, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalElements"], 2);
    }

    #[tokio::test]
    async fn test_staff_list_for_other_dairy_center_is_forbidden() {
        let app: Router = create_test_app();
        let own: i64 = onboard(&app, "Bharatpur Dairy").await;
        let other: i64 = onboard(&app, "Ratnanagar Dairy").await;
        let token: String = staff_token(&app, own).await;

        let (status, _) = send(&app, get_request(&format!("/api/staff/dairy/{other}"), Some(&token))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_upload_and_query_collection_records() {
        let app: Router = create_test_app();
        let dairy_center_id: i64 = onboard(&app, "Bharatpur Dairy").await;
        let token: String = staff_token(&app, dairy_center_id).await;
        let farmer: Value = farmer_login(&app, dairy_center_id, "M001").await;
        let farmer_token: &str = farmer["accessToken"].as_str().unwrap();

        let (status, body) = send(&app, upload_request(&token, Some(dairy_center_id), &sample_csv())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["totalRecords"], 5);
        assert_eq!(body["data"]["successfulRecords"], 4);
        assert_eq!(body["data"]["failedRecords"], 1);
        assert_eq!(body["data"]["errors"][0]["rowNumber"], 5);
        assert_eq!(body["message"], "CSV processed: 4/5 records saved successfully");

        let (status, body) = send(
            &app,
            get_request("/api/milk/dairy/month?nepaliMonth=06&nepaliYear=2082", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"][0]["dairyCenterName"], "Bharatpur Dairy");

        let (status, body) = send(
            &app,
            get_request(
                "/api/milk/farmer/M001/month?nepaliMonth=06&nepaliYear=2082",
                Some(farmer_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let records: &Vec<Value> = body["data"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["farmerName"] == "Ram Farmer"));

        let (status, _) = send(
            &app,
            get_request(
                "/api/milk/farmer/M002/month?nepaliMonth=06&nepaliYear=2082",
                Some(farmer_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, get_request("/api/milk/farmer/M002", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["farmerName"], dairy_api::UNKNOWN_FARMER_NAME);
    }

    #[tokio::test]
    async fn test_farmer_cannot_upload() {
        let app: Router = create_test_app();
        let dairy_center_id: i64 = onboard(&app, "Bharatpur Dairy").await;
        let farmer: Value = farmer_login(&app, dairy_center_id, "M001").await;

        let (status, body) = send(
            &app,
            upload_request(farmer["accessToken"].as_str().unwrap(), None, &sample_csv()),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_upload_for_other_dairy_center_is_forbidden() {
        let app: Router = create_test_app();
        let own: i64 = onboard(&app, "Bharatpur Dairy").await;
        let other: i64 = onboard(&app, "Ratnanagar Dairy").await;
        let token: String = staff_token(&app, own).await;

        let (status, _) = send(&app, upload_request(&token, Some(other), &sample_csv())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, body) = send(
            &app,
            get_request("/api/milk/dairy/month?nepaliMonth=06&nepaliYear=2082", Some(&token)),
        )
        .await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_empty_upload_is_bad_request() {
        let app: Router = create_test_app();
        let dairy_center_id: i64 = onboard(&app, "Bharatpur Dairy").await;
        let token: String = staff_token(&app, dairy_center_id).await;

        let (status, body) = send(&app, upload_request(&token, None, "  ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_api_error_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                ApiError::AuthenticationFailed {
                    reason: String::from("Invalid credentials"),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Unauthorized {
                    action: String::from("upload_collection"),
                    required_role: String::from("ROLE_DAIRY_STAFF"),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::DomainRuleViolation {
                    rule: String::from("unique_dairy_center_name"),
                    message: String::from("taken"),
                },
                StatusCode::CONFLICT,
            ),
            (
                ApiError::InvalidCsvFormat {
                    reason: String::from("CSV file is empty"),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Internal {
                    message: String::from("disk full"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let http: HttpError = HttpError::from(err);
            assert_eq!(http.status, expected);
            assert_ne!(http.message, "disk full");
        }
    }
}
