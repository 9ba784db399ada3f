//! Profile and image entity models and DTOs.
//!
//! A profile owns its images; deleting the profile row cascades to them.
//! `job_id` is a weak reference with no foreign key behind it.

use persona_core::category::PictureCategory;
use persona_core::types::{DbId, EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: EntityId,
    pub user_id: DbId,
    pub job_id: Option<EntityId>,
    pub picture_category: String,
    /// Requested posts; may exceed the post images actually present.
    pub post_count: i32,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// A profile with its images in generation order.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithImages {
    #[serde(flatten)]
    pub profile: Profile,
    pub images: Vec<Image>,
}

impl ProfileWithImages {
    /// The profile picture, if one was generated.
    pub fn picture(&self) -> Option<&Image> {
        self.images.iter().find(|image| !image.is_post)
    }

    /// Post images in generation order.
    pub fn posts(&self) -> impl Iterator<Item = &Image> {
        self.images.iter().filter(|image| image.is_post)
    }
}

/// A profile built during a generation run, streamed to the client as it
/// grows and written in the final commit.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProfile {
    pub id: EntityId,
    pub job_id: Option<EntityId>,
    pub picture_category: PictureCategory,
    pub post_count: i32,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub images: Vec<CreateImage>,
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A row from the `images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub profile_id: EntityId,
    /// Server filesystem path; never sent to clients.
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub public_url: String,
    pub category: String,
    pub sequence_index: i32,
    pub is_post: bool,
    pub prompt: String,
    pub generated_at: Timestamp,
}

/// One written image file plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct CreateImage {
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub public_url: String,
    pub category: PictureCategory,
    pub sequence_index: i32,
    pub is_post: bool,
    pub prompt: String,
    pub generated_at: Timestamp,
}
