/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a new user, returns a session token
/// - `POST /auth/login` - Login with email and password
/// - `GET  /auth/me` - Current user's profile (bearer token required)
///
/// Login failures never reveal whether the email exists or the password was
/// wrong; both legs produce the identical 401 body.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use taskzen_shared::{
    auth::{identity, password},
    models::user::{CreateUser, User, UserProfile},
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Password
    pub password: Option<String>,
}

/// Response for register and login: a bearer token plus the profile
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Signed access token
    pub token: String,

    /// The authenticated user, without credential material
    pub user: UserProfile,
}

/// Response for `GET /auth/me`
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The authenticated user
    pub user: UserProfile,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "name": "Ann", "email": "a@x.com", "password": "secret123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing or malformed field
/// - `409 Conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let name = req
        .name
        .ok_or_else(|| ApiError::validation("name", "Name is required"))?;
    let email = req
        .email
        .ok_or_else(|| ApiError::validation("email", "Email is required"))?;
    let plaintext = req
        .password
        .ok_or_else(|| ApiError::validation("password", "Password is required"))?;

    let password_hash = password::hash_password(&plaintext)?;

    // A duplicate email surfaces as a unique-index conflict from the insert
    // itself; no check-then-act window
    let user = User::create(
        &state.db,
        CreateUser {
            name,
            email: Some(email),
            password_hash: Some(password_hash),
            google_id: None,
            github_id: None,
        },
    )
    .await?;

    let token = state.issue_session_token(user.id)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(user),
        }),
    ))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "a@x.com", "password": "secret123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing field
/// - `401 Unauthorized`: invalid credentials (uniform body for unknown
///   email and wrong password)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let email = req
        .email
        .ok_or_else(|| ApiError::validation("email", "Email is required"))?;
    let plaintext = req
        .password
        .ok_or_else(|| ApiError::validation("password", "Password is required"))?;

    let user = identity::resolve_by_password(&state.db, &email, &plaintext).await?;

    User::update_last_login(&state.db, user.id).await?;

    let token = state.issue_session_token(user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}

/// Current user's profile
///
/// Requires a bearer token; the auth gate has already resolved the user and
/// stripped the password digest.
pub async fn me(Extension(current): Extension<CurrentUser>) -> ApiResult<Json<MeResponse>> {
    Ok(Json(MeResponse { user: current.0 }))
}
