//! Route definitions for `/profiles`.
//!
//! Kept flat rather than nested so the streaming route can be added after
//! the timeout layer without a path conflict.

use axum::routing::get;
use axum::Router;

use crate::handlers::{generation, profiles};
use crate::state::AppState;

/// `GET /profiles -> list`
pub fn router() -> Router<AppState> {
    Router::new().route("/profiles", get(profiles::list))
}

/// `GET /profiles/generate -> generate` (SSE)
pub fn stream_router() -> Router<AppState> {
    Router::new().route("/profiles/generate", get(generation::generate))
}
