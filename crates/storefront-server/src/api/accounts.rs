//! Signup, login and the caller's own profile.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{normalize_email, validate_password, validate_signup, Address, Role};
use storefront_db::{NewUser, ProfileUpdate, UserRow};

use crate::auth::{hash_password, verify_password, AuthError};
use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, map_unique_violation, validation_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// A user as exposed over the API. Never carries the password hash.
#[derive(Debug, Serialize)]
pub(super) struct UserItem {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserItem {
    fn from(row: UserRow) -> Self {
        let role = row.role();
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            phone: row.phone,
            address: row.address.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SessionData {
    pub token: String,
    pub user: UserItem,
}

#[derive(Debug, Serialize)]
pub(super) struct MessageData {
    pub message: &'static str,
}

fn auth_failure(request_id: &str, error: &AuthError) -> ApiError {
    tracing::error!(error = %error, "credential processing failed");
    ApiError::new(request_id, "internal_error", "authentication failed")
}

fn session(state: &AppState, request_id: &str, row: UserRow) -> Result<SessionData, ApiError> {
    let token = state
        .tokens
        .issue(row.id, row.role())
        .map_err(|e| auth_failure(request_id, &e))?;
    Ok(SessionData {
        token,
        user: row.into(),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
pub(super) async fn signup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionData>>), ApiError> {
    let rid = &req_id.0;
    validate_signup(&body.name, &body.email, &body.password)
        .map_err(|e| validation_error(rid, &e))?;

    let email = normalize_email(&body.email);
    let password_hash = hash_password(body.password)
        .await
        .map_err(|e| auth_failure(rid, &e))?;
    let phone = body.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let row = storefront_db::create_user(
        &state.pool,
        &NewUser {
            name: body.name.trim(),
            email: &email,
            password_hash: &password_hash,
            role: Role::Customer,
            phone,
        },
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, "User already exists"))?;

    tracing::info!(user_id = row.id, "account created");
    let data = session(&state, rid, row)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(data, req_id.0)),
    ))
}

/// POST /api/v1/auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionData>>, ApiError> {
    let rid = &req_id.0;
    let invalid = || ApiError::new(rid, "unauthorized", "Invalid credentials");

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "Please provide email and password",
        ));
    }

    let row = storefront_db::get_user_by_email(&state.pool, &normalize_email(&body.email))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(invalid)?;

    let verified = verify_password(body.password, row.password_hash.clone())
        .await
        .map_err(|e| auth_failure(rid, &e))?;
    if !verified {
        return Err(invalid());
    }

    let data = session(&state, rid, row)?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/auth/logout. Sessions are stateless; the client drops its
/// token.
pub(super) async fn logout(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<MessageData>> {
    Json(ApiResponse::new(
        MessageData {
            message: "Logged out successfully",
        },
        req_id.0,
    ))
}

/// GET /api/v1/auth/me
pub(super) async fn me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let row = storefront_db::get_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", "User not found"))?;

    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

/// PUT /api/v1/auth/profile
pub(super) async fn update_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let rid = &req_id.0;

    let name = body.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(ApiError::new(rid, "validation_error", "Please provide a name"));
    }

    let password_hash = match body.password {
        Some(password) => {
            validate_password(&password).map_err(|e| validation_error(rid, &e))?;
            Some(
                hash_password(password)
                    .await
                    .map_err(|e| auth_failure(rid, &e))?,
            )
        }
        None => None,
    };

    let row = storefront_db::update_profile(
        &state.pool,
        user.id,
        &ProfileUpdate {
            name,
            phone: body.phone.as_deref().map(str::trim),
            address: body.address.as_ref(),
            password_hash: password_hash.as_deref(),
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::new(rid, "not_found", "User not found"))?;

    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}
