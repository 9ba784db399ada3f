//! Repository for the `images` table.

use persona_core::types::{DbId, EntityId};
use sqlx::PgPool;

use crate::models::profile::Image;

const COLUMNS: &str = "id, profile_id, storage_path, public_url, category, \
                       sequence_index, is_post, prompt, generated_at";

/// Read access to generated image records. Writes happen inside the job
/// commit transaction.
pub struct ImageRepo;

impl ImageRepo {
    /// Images of the given profiles, grouped by profile in generation order.
    pub async fn list_for_profiles(
        pool: &PgPool,
        profile_ids: &[EntityId],
    ) -> Result<Vec<Image>, sqlx::Error> {
        if profile_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM images
             WHERE profile_id = ANY($1)
             ORDER BY profile_id, sequence_index"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(profile_ids)
            .fetch_all(pool)
            .await
    }

    /// Number of images the user currently owns. Seeds the per-run
    /// sequence counter.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM images i
             JOIN profiles p ON p.id = i.profile_id
             WHERE p.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Filesystem paths of every image of the given profiles.
    pub async fn storage_paths_for_profiles(
        pool: &PgPool,
        profile_ids: &[EntityId],
    ) -> Result<Vec<String>, sqlx::Error> {
        if profile_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, String>(
            "SELECT storage_path FROM images WHERE profile_id = ANY($1) ORDER BY sequence_index",
        )
        .bind(profile_ids)
        .fetch_all(pool)
        .await
    }
}
