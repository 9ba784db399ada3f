//! HTTP client for the fal.ai synchronous inference endpoint.
//!
//! One render is two requests: `POST {base_url}/{model}` with the prompt,
//! which answers with a hosted image URL, then a `GET` of that URL for the
//! bytes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ImageGenError, ImageProvider, ImageSize};

/// Default inference endpoint.
const DEFAULT_BASE_URL: &str = "https://fal.run";
/// Default model path.
const DEFAULT_MODEL: &str = "fal-ai/flux-pro/v1.1";
/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Safety tolerance sent with every render (1 strictest, 6 most permissive).
const SAFETY_TOLERANCE: &str = "2";

/// Provider credentials and endpoint settings.
#[derive(Debug, Clone)]
pub struct FalConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub image_size: ImageSize,
    pub timeout_secs: u64,
}

impl FalConfig {
    /// Load provider configuration from environment variables.
    ///
    /// | Env Var            | Required | Default                |
    /// |--------------------|----------|------------------------|
    /// | `FAL_API_KEY`      | **yes**  | --                     |
    /// | `FAL_BASE_URL`     | no       | `https://fal.run`      |
    /// | `FAL_MODEL`        | no       | `fal-ai/flux-pro/v1.1` |
    /// | `FAL_IMAGE_SIZE`   | no       | `square_hd`            |
    /// | `FAL_TIMEOUT_SECS` | no       | `300`                  |
    ///
    /// # Panics
    ///
    /// Panics if `FAL_API_KEY` is missing or any value fails to parse.
    pub fn from_env() -> Self {
        let api_key =
            std::env::var("FAL_API_KEY").expect("FAL_API_KEY must be set in the environment");
        assert!(!api_key.is_empty(), "FAL_API_KEY must not be empty");

        let base_url = std::env::var("FAL_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let model = std::env::var("FAL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let image_size = match std::env::var("FAL_IMAGE_SIZE") {
            Ok(name) => ImageSize::from_name(&name)
                .unwrap_or_else(|| panic!("FAL_IMAGE_SIZE `{name}` is not a known size")),
            Err(_) => ImageSize::default(),
        };

        let timeout_secs: u64 = std::env::var("FAL_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("FAL_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            base_url,
            model,
            image_size,
            timeout_secs,
        }
    }
}

/// Request body for one render.
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    prompt: &'a str,
    image_size: &'static str,
    num_images: u32,
    enable_safety_checker: bool,
    safety_tolerance: &'static str,
    output_format: &'static str,
}

/// The subset of the provider's response the client relies on.
#[derive(Debug, Deserialize)]
struct RenderResponse {
    #[serde(default)]
    images: Vec<RenderedImage>,
    #[serde(default)]
    has_nsfw_concepts: Vec<bool>,
}

#[derive(Debug, Deserialize)]
struct RenderedImage {
    url: String,
}

/// Production [`ImageProvider`] backed by fal.ai.
pub struct FalClient {
    client: reqwest::Client,
    config: FalConfig,
}

impl FalClient {
    /// Build a client with its own connection pool and the configured timeout.
    pub fn new(config: FalConfig) -> Result<Self, ImageGenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Build a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: FalConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.config.base_url, self.config.model)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, otherwise turn the
    /// status and body into [`ImageGenError::Api`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ImageGenError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ImageGenError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ImageProvider for FalClient {
    async fn render(&self, prompt: &str, size: ImageSize) -> Result<Vec<u8>, ImageGenError> {
        let body = RenderRequest {
            prompt,
            image_size: size.as_str(),
            num_images: 1,
            enable_safety_checker: true,
            safety_tolerance: SAFETY_TOLERANCE,
            output_format: "jpeg",
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;
        let rendered: RenderResponse = Self::ensure_success(response).await?.json().await?;
        let url = image_url(rendered)?;

        tracing::debug!(model = %self.config.model, %url, "Downloading rendered image");
        let response = self.client.get(&url).send().await?;
        let bytes = Self::ensure_success(response).await?.bytes().await?;
        check_image_bytes(&bytes)?;

        Ok(bytes.to_vec())
    }
}

/// Pull the single image URL out of a render response.
fn image_url(response: RenderResponse) -> Result<String, ImageGenError> {
    if response.has_nsfw_concepts.iter().any(|&flagged| flagged) {
        return Err(ImageGenError::ContentRejected);
    }
    response
        .images
        .into_iter()
        .next()
        .map(|image| image.url)
        .ok_or_else(|| ImageGenError::InvalidResponse("no image in response".into()))
}

/// Reject payloads that are not a recognisable image format.
fn check_image_bytes(bytes: &[u8]) -> Result<(), ImageGenError> {
    image::guess_format(bytes)
        .map(|_| ())
        .map_err(|e| {
            ImageGenError::InvalidResponse(format!("downloaded bytes are not an image: {e}"))
        })
}
