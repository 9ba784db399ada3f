//! Job entity model and the DTO committed at the end of a generation run.

use indexmap::IndexMap;
use persona_core::category::PictureCategory;
use persona_core::types::{DbId, EntityId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use super::profile::ProfileWithImages;

/// A row from the `jobs` table.
///
/// Immutable once written; only the expiry sweep deletes it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: EntityId,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub started_at: Timestamp,
    pub expires_at: Timestamp,
    pub num_profiles: i32,
    pub profiles_with_pics: i32,
    pub profiles_with_posts: i32,
    pub min_posts_per_profile: i32,
    pub max_posts_per_profile: i32,
    pub picture_type_distribution: Json<IndexMap<PictureCategory, u32>>,
    pub credits_before_job: i32,
    pub credits_used: i32,
    pub credits_after_job: i32,
}

/// A job together with its still-resolvable profiles, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct JobWithProfiles {
    #[serde(flatten)]
    pub job: Job,
    pub profiles: Vec<ProfileWithImages>,
}

/// Everything the commit needs to write a job row.
///
/// The credit columns are not here: `credits_before_job` is read under the
/// user row lock inside the commit transaction and the rest derive from it.
#[derive(Debug, Clone, Serialize)]
pub struct CreateJob {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub started_at: Timestamp,
    pub expires_at: Timestamp,
    pub num_profiles: i32,
    pub profiles_with_pics: i32,
    pub profiles_with_posts: i32,
    pub min_posts_per_profile: i32,
    pub max_posts_per_profile: i32,
    pub picture_type_distribution: IndexMap<PictureCategory, u32>,
    /// Total images written across the job's profiles.
    pub credits_used: i32,
}
