//! Auth API Endpoints
//!
//! Staff account registration and login.
//! - POST /register - Create a counsellor/teacher account
//! - POST /login - Password-based login
//! - GET /me - Get current account info
//! - GET /teachers - List teacher accounts (admin/counsellor only)

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::auth_service::AuthService;
use crate::auth::password_service::PasswordService;
use crate::shared::authorization::checks;
use crate::shared::error::AdmissionsError;
use crate::shared::middleware::Authenticated;
use crate::shared::validation;
use crate::user::entity::{Role, User};
use crate::user::repository::UserRepository;

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Username (alphabetic only, unique)
    pub username: String,

    /// Phone number (10 digits, unique)
    pub phone_number: String,

    /// Institutional email address (unique)
    pub email: String,

    /// Password (min 8 chars, at least 1 letter and 1 number)
    pub password: String,

    /// Must match `password`
    pub confirm_password: String,

    /// Account role; defaults to counsellor
    #[serde(default)]
    pub role: Role,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account representation returned to callers (password hash omitted)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub phone_number: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            phone_number: u.phone_number,
            email: u.email,
            role: u.role,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserData {
    pub user: UserResponse,
}

/// Register/login response: token plus the account
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub status: String,
    pub token: String,
    pub data: UserData,
}

/// Current account response
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeachersData {
    pub teachers: Vec<UserResponse>,
}

/// Teacher listing response
#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherListResponse {
    pub status: String,
    pub results: usize,
    pub data: TeachersData,
}

/// Auth service state
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub user_repo: Arc<UserRepository>,
    pub password_service: Arc<PasswordService>,
}

/// Register a new staff account
///
/// Checks run in a fixed order: password confirmation, institutional domain,
/// then email/username/phone uniqueness, then field formats.
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    operation_id = "postAuthRegister",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error")
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AdmissionsError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if req.password != req.confirm_password {
        return Err(AdmissionsError::validation("Passwords do not match"));
    }

    if !validation::is_institution_email(&email) {
        return Err(AdmissionsError::validation(format!(
            "Please use your university email ({})",
            validation::INSTITUTION_EMAIL_SUFFIX
        )));
    }

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AdmissionsError::duplicate("email"));
    }

    if state.user_repo.find_by_username(&username).await?.is_some() {
        return Err(AdmissionsError::duplicate("username"));
    }

    if state.user_repo.find_by_phone(&req.phone_number).await?.is_some() {
        return Err(AdmissionsError::duplicate("phoneNumber"));
    }

    if !validation::is_alphabetic(&username) {
        return Err(AdmissionsError::validation("Username must contain only alphabets"));
    }

    if !validation::is_valid_phone(&req.phone_number) {
        return Err(AdmissionsError::validation("Phone number must be 10 digits"));
    }

    if !validation::is_valid_email(&email) {
        return Err(AdmissionsError::validation("Please provide a valid email"));
    }

    // Policy violations surface here, before anything is persisted
    let password_hash = state.password_service.hash_password(&req.password)?;

    let user = User::new(username, req.phone_number, email, password_hash, req.role);
    state.user_repo.insert(&user).await?;

    let token = state.auth_service.generate_token(&user.id)?;

    tracing::info!(user_id = %user.id, role = ?user.role, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            status: "success".to_string(),
            token,
            data: UserData { user: user.into() },
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postAuthLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AdmissionsError> {
    let (email, password) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e.to_lowercase(), p),
        _ => return Err(AdmissionsError::validation("Please provide email and password")),
    };

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AdmissionsError::unauthorized("Incorrect email or password"))?;

    if !state
        .password_service
        .verify_password(&password, &user.password_hash)?
    {
        return Err(AdmissionsError::unauthorized("Incorrect email or password"));
    }

    // Domain restriction applies after credential verification
    if !validation::is_institution_email(&user.email) {
        return Err(AdmissionsError::unauthorized(format!(
            "Please use your university email ({})",
            validation::INSTITUTION_EMAIL_SUFFIX
        )));
    }

    let token = state.auth_service.generate_token(&user.id)?;

    Ok(Json(AuthResponse {
        status: "success".to_string(),
        token,
        data: UserData { user: user.into() },
    }))
}

/// Get the authenticated caller's account
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    operation_id = "getAuthMe",
    responses(
        (status = 200, description = "Current account", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AuthState>,
    auth: Authenticated,
) -> Result<Json<CurrentUserResponse>, AdmissionsError> {
    let user = state
        .user_repo
        .find_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| AdmissionsError::not_found("user", &auth.user_id))?;

    Ok(Json(CurrentUserResponse {
        status: "success".to_string(),
        data: UserData { user: user.into() },
    }))
}

/// List all teacher accounts
///
/// Restricted to admins and counsellors; sorted ascending by username.
#[utoipa::path(
    get,
    path = "/teachers",
    tag = "auth",
    operation_id = "getAuthTeachers",
    responses(
        (status = 200, description = "Teacher accounts", body = TeacherListResponse),
        (status = 403, description = "Role not permitted")
    ),
    security(("bearer_auth" = []))
)]
pub async fn teachers(
    State(state): State<AuthState>,
    auth: Authenticated,
) -> Result<Json<TeacherListResponse>, AdmissionsError> {
    checks::require_role(&auth.0, &[Role::Admin, Role::Counsellor])?;

    let teachers: Vec<UserResponse> = state
        .user_repo
        .find_by_role(Role::Teacher)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(TeacherListResponse {
        status: "success".to_string(),
        results: teachers.len(),
        data: TeachersData { teachers },
    }))
}

/// Create auth router
pub fn auth_router(state: AuthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(me))
        .routes(routes!(teachers))
        .with_state(state)
}
