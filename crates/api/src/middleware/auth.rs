//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use persona_core::types::DbId;

use crate::auth::cookie::read_session_cookie;
use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user, from the `token` cookie or an
/// `Authorization: Bearer` header. The header wins when both are present.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub username: String,
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = match parts.headers.get(AUTHORIZATION) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| AppError::unauthorized("Invalid Authorization header"))?;
                Some(value.strip_prefix("Bearer ").ok_or_else(|| {
                    AppError::unauthorized("Invalid Authorization format. Expected: Bearer <token>")
                })?)
            }
            None => None,
        };

        let jar = CookieJar::from_headers(&parts.headers);
        let token = bearer
            .or_else(|| read_session_cookie(&jar))
            .ok_or_else(|| AppError::unauthorized("Not authenticated"))?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
