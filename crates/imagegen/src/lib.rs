//! Image provider contract and the fal.ai HTTP client.
//!
//! The pipeline only sees [`ImageProvider`]: one prompt in, one image's
//! bytes out, or an [`ImageGenError`]. Calls are single-shot and never
//! retried here.

use async_trait::async_trait;

pub mod error;
pub mod fal;

pub use error::ImageGenError;
pub use fal::{FalClient, FalConfig};

/// Size hint passed with every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[default]
    SquareHd,
    Square,
    PortraitFourThree,
    PortraitSixteenNine,
    LandscapeFourThree,
    LandscapeSixteenNine,
}

impl ImageSize {
    /// Wire name understood by the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SquareHd => "square_hd",
            Self::Square => "square",
            Self::PortraitFourThree => "portrait_4_3",
            Self::PortraitSixteenNine => "portrait_16_9",
            Self::LandscapeFourThree => "landscape_4_3",
            Self::LandscapeSixteenNine => "landscape_16_9",
        }
    }

    /// Parse a wire name. Returns `None` for unknown sizes.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "square_hd" => Some(Self::SquareHd),
            "square" => Some(Self::Square),
            "portrait_4_3" => Some(Self::PortraitFourThree),
            "portrait_16_9" => Some(Self::PortraitSixteenNine),
            "landscape_4_3" => Some(Self::LandscapeFourThree),
            "landscape_16_9" => Some(Self::LandscapeSixteenNine),
            _ => None,
        }
    }
}

/// Something that turns a prompt into image bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn render(&self, prompt: &str, size: ImageSize) -> Result<Vec<u8>, ImageGenError>;
}
