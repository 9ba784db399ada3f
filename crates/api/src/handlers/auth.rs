//! Handlers for the `/auth` resource (login, logout, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::CookieJar;
use persona_core::error::CoreError;
use persona_db::models::user::UserResponse;
use persona_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{validate_credential, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login payload. The same token is also set as a cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    validate_credential("Username", &input.username).map_err(CoreError::Validation)?;
    validate_credential("Password", &input.password).map_err(CoreError::Validation)?;

    let invalid = || AppError::unauthorized("Invalid username or password");

    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(username = %user.username, "Login rejected: wrong password");
        return Err(invalid());
    }

    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &user.username, &user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
    let cookie = session_cookie(
        access_token.clone(),
        jwt.expiry_secs(),
        state.config.cookie_secure,
    );

    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        jar.add(cookie),
        Json(DataResponse {
            data: LoginResponse {
                access_token,
                user: UserResponse::from(&user),
            },
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Clears the session cookie. Tokens are stateless, so there is nothing to
/// revoke server-side.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        jar.add(clear_session_cookie(state.config.cookie_secure)),
    )
}

/// GET /api/v1/auth/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", auth.user_id))?;

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}
