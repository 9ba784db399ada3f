//! Events a pipeline run pushes to its client.
//!
//! A run emits zero or more `Progress` events followed by exactly one
//! terminal event, either `Error` or `Complete`.

use async_trait::async_trait;
use persona_core::progress::ProgressSnapshot;
use persona_db::models::profile::CreateProfile;
use serde::Serialize;
use tokio::sync::mpsc;

/// One streamed event. Serialises to `{profile, progress}`, `{error}` or
/// `{complete: true}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Progress {
        /// The profile being generated, with every image so far.
        profile: CreateProfile,
        progress: ProgressSnapshot,
    },
    Error {
        error: String,
    },
    Complete {
        complete: bool,
    },
}

impl StreamEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn complete() -> Self {
        Self::Complete { complete: true }
    }

    /// Whether the stream ends after this event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Where a run reports progress. Delivery is best-effort: a sink whose
/// reader has gone away swallows events and the run carries on.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: StreamEvent);
}

#[async_trait]
impl ProgressSink for mpsc::Sender<StreamEvent> {
    async fn emit(&self, event: StreamEvent) {
        if self.send(event).await.is_err() {
            tracing::debug!("Progress receiver dropped; continuing without a client");
        }
    }
}
