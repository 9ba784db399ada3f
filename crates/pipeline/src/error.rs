use persona_core::error::CoreError;
use persona_core::types::DbId;
use persona_db::repositories::CommitError;
use persona_imagegen::ImageGenError;

/// Why a pipeline run did not complete.
///
/// `InvalidRequest` and `UserNotFound` reject the run before any image is
/// generated. The rest abort it after cleanup.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRequest(#[from] CoreError),

    #[error("User {0} not found")]
    UserNotFound(DbId),

    #[error(transparent)]
    Generation(#[from] ImageGenError),

    /// Writing a rendered image to disk failed. Aborts like a generation
    /// failure.
    #[error("Failed to store image: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Failed to save profiles: {0}")]
    Persistence(#[from] CommitError),
}

impl PipelineError {
    /// Whether the run stopped before generating anything.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::UserNotFound(_))
    }

    /// Message carried by the stream's error event.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(CoreError::Validation(msg)) => msg.clone(),
            Self::InvalidRequest(e) => e.to_string(),
            Self::UserNotFound(_) => "User not found".into(),
            Self::Generation(e) => e.to_string(),
            Self::Storage(_) => "Failed to store generated image".into(),
            Self::Persistence(_) => "Failed to save profiles".into(),
        }
    }
}
