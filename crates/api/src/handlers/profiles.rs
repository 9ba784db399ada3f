//! Handlers for the `/profiles` listing.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use persona_db::repositories::ProfileRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/profiles
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let profiles = ProfileRepo::list_active_for_user(&state.pool, auth.user_id, Utc::now()).await?;
    Ok(Json(DataResponse { data: profiles }))
}
