//! Route definitions for the `/jobs` resource.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET /                -> list
/// GET /{id}/download   -> download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list))
        .route("/{id}/download", get(jobs::download))
}
