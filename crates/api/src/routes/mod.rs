pub mod auth;
pub mod health;
pub mod jobs;
pub mod profiles;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                     login (public)
/// /auth/logout                    logout
/// /auth/me                        current user
///
/// /jobs                           list non-expired jobs with profiles
/// /jobs/{id}/download             zip archive of a job's profiles
///
/// /profiles                       list non-expired profiles
/// /profiles/generate              submit a job, progress as SSE (no timeout)
/// ```
///
/// Every route except the generation stream sits behind the request
/// timeout. The stream stays open for as long as the job renders.
pub fn api_routes(request_timeout: Duration) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/jobs", jobs::router())
        .merge(profiles::router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .merge(profiles::stream_router())
}
