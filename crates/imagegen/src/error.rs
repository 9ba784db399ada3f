/// Errors from rendering one image. Every variant aborts the job.
#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("Image request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Image provider error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A 2xx response that did not carry a usable image.
    #[error("Invalid response from image provider: {0}")]
    InvalidResponse(String),

    /// The provider's safety checker flagged the result.
    #[error("Image rejected by content safety check")]
    ContentRejected,
}
