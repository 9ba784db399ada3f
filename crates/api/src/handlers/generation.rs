//! Handler for the streaming job submission endpoint.
//!
//! The job runs in its own task and reports through a bounded channel that
//! backs the SSE body. If the client goes away the job still runs to the
//! end and commits; only the events are lost.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderName;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::StreamExt;
use indexmap::IndexMap;
use persona_core::allocation::JobRequest;
use persona_core::error::CoreError;
use persona_pipeline::StreamEvent;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Events buffered between the job task and a slow client.
const EVENT_BUFFER: usize = 64;

/// Query parameters of `GET /profiles/generate`.
///
/// The distribution arrives as a JSON-encoded object string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuery {
    pub num_profiles: i64,
    #[serde(default)]
    pub profiles_with_pics: i64,
    #[serde(default, alias = "picTypeDistribution")]
    pub picture_type_distribution: Option<String>,
    #[serde(default)]
    pub profiles_with_posts: i64,
    #[serde(default)]
    pub min_posts_per_profile: i64,
    #[serde(default)]
    pub max_posts_per_profile: i64,
}

impl GenerateQuery {
    /// Decode the distribution string. Keys keep the order they were sent in.
    pub fn into_request(self) -> Result<JobRequest, CoreError> {
        let picture_type_distribution = match self.picture_type_distribution.as_deref() {
            None | Some("") => IndexMap::new(),
            Some(raw) => serde_json::from_str::<IndexMap<String, i64>>(raw).map_err(|e| {
                CoreError::Validation(format!("Invalid picture type distribution: {e}"))
            })?,
        };

        Ok(JobRequest {
            num_profiles: self.num_profiles,
            profiles_with_pics: self.profiles_with_pics,
            picture_type_distribution,
            profiles_with_posts: self.profiles_with_posts,
            min_posts_per_profile: self.min_posts_per_profile,
            max_posts_per_profile: self.max_posts_per_profile,
        })
    }
}

/// GET /api/v1/profiles/generate
///
/// Streams `{profile, progress}` events while the job runs, then one
/// `{complete: true}` or `{error}` event.
pub async fn generate(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> AppResult<impl IntoResponse> {
    let request = query.into_request()?;
    let (tx, rx) = mpsc::channel::<StreamEvent>(EVENT_BUFFER);

    let pipeline = Arc::clone(&state.pipeline);
    let user_id = auth.user_id;
    tokio::spawn(async move {
        // The outcome has already been logged and streamed.
        let _ = pipeline.run(user_id, &request, &tx).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(encode_event(&event)));

    Ok((
        [
            (CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    ))
}

fn encode_event(event: &StreamEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode stream event");
        Event::default().data(r#"{"error":"Failed to encode progress update"}"#)
    })
}
