//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, logout, and the
//! current-user lookup.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use booktrack_core::ports::PortError;

use crate::error::ApiError;
use crate::web::middleware::{session_token, AuthedUser, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The password hash never appears here; this is the full public view of a user.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// A well-formed argon2id hash whose parameters match `Argon2::default()`,
/// so a verification against it costs the same as one against a real
/// stored hash. Used to keep the unknown-email and wrong-password login
/// failures indistinguishable by timing.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// Runs a full-cost password verification whose outcome is discarded.
fn burn_password_verification(password: &str) {
    if let Ok(parsed) = PasswordHash::new(DUMMY_HASH) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}

fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    )
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("failed to hash password: {:?}", e);
            ApiError::Internal("failed to hash password".to_string())
        })
}

/// Creates a session row and returns the Set-Cookie value for it.
async fn issue_session(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let token = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    let issued_at = Utc::now();
    state
        .db
        .create_auth_session(&token, user_id, issued_at, issued_at + ttl)
        .await?;
    Ok(session_cookie(&token, ttl.num_seconds()))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() {
        return Err(PortError::Validation("email must not be empty".to_string()).into());
    }
    if req.password.is_empty() {
        return Err(PortError::Validation("password must not be empty".to_string()).into());
    }
    if req.name.trim().is_empty() {
        return Err(PortError::Validation("name must not be empty".to_string()).into());
    }

    let password_hash = hash_password(&req.password)?;

    // Duplicate emails surface as a 409 through the Conflict port error.
    let user = state
        .db
        .create_user(&req.email, req.name.trim(), &password_hash)
        .await?;

    let cookie = issue_session(&state, user.id).await?;

    let response = UserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = match state.db.get_user_credentials_by_email(&req.email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => {
            // Unknown email: verify against the fixed dummy hash so this
            // path costs the same as a wrong-password failure.
            burn_password_verification(&req.password);
            return Err(PortError::Unauthorized.into());
        }
        Err(e) => return Err(e.into()),
    };

    let parsed_hash = PasswordHash::new(&creds.password_hash).map_err(|e| {
        error!("failed to parse stored password hash: {:?}", e);
        ApiError::Internal("authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err(PortError::Unauthorized.into());
    }

    let cookie = issue_session(&state, creds.id).await?;

    let response = UserResponse {
        id: creds.id,
        email: creds.email,
        name: creds.name,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /api/auth/logout - Logout and invalidate the session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // Idempotent: a missing or already-deleted token still clears the cookie.
    if let Some(token) = session_token(&headers) {
        state.db.delete_auth_session(token).await?;
    }

    let cleared = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cleared)]))
}

/// GET /api/auth/me - The currently authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.db.get_user_by_id(user_id).await?;
    Ok(Json(UserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
    }))
}
