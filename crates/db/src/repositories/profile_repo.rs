//! Repository for the `profiles` table.

use std::collections::HashMap;

use persona_core::expiry::ProfileStamp;
use persona_core::types::{DbId, EntityId, Timestamp};
use sqlx::PgPool;

use crate::models::profile::{Image, Profile, ProfileWithImages};
use crate::repositories::ImageRepo;

const COLUMNS: &str = "id, user_id, job_id, picture_category, post_count, created_at, expires_at";

/// Read access to profiles. Inserts happen in the job commit transaction and
/// deletes in the expiry purge.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Every non-expired profile of a user, oldest first, with images.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<ProfileWithImages>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM profiles
             WHERE user_id = $1 AND expires_at > $2
             ORDER BY created_at, id"
        );
        let profiles = sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await?;
        Self::attach_images(pool, profiles).await
    }

    /// Non-expired profiles whose `job_id` resolves to one of `job_ids`.
    pub async fn list_active_for_jobs(
        pool: &PgPool,
        user_id: DbId,
        job_ids: &[EntityId],
        now: Timestamp,
    ) -> Result<Vec<ProfileWithImages>, sqlx::Error> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM profiles
             WHERE user_id = $1 AND job_id = ANY($2) AND expires_at > $3
             ORDER BY created_at, id"
        );
        let profiles = sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(job_ids)
            .bind(now)
            .fetch_all(pool)
            .await?;
        Self::attach_images(pool, profiles).await
    }

    /// Expiry-relevant fields of every profile a user owns.
    pub async fn list_stamps_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ProfileStamp>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (EntityId, Option<EntityId>, Timestamp)>(
            "SELECT id, job_id, expires_at FROM profiles
             WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, job_id, expires_at)| ProfileStamp {
                id,
                job_id,
                expires_at,
            })
            .collect())
    }

    /// Load images for `profiles` and pair them up, preserving profile order.
    async fn attach_images(
        pool: &PgPool,
        profiles: Vec<Profile>,
    ) -> Result<Vec<ProfileWithImages>, sqlx::Error> {
        let ids: Vec<EntityId> = profiles.iter().map(|p| p.id).collect();
        let mut by_profile: HashMap<EntityId, Vec<Image>> = HashMap::new();
        for image in ImageRepo::list_for_profiles(pool, &ids).await? {
            by_profile.entry(image.profile_id).or_default().push(image);
        }

        Ok(profiles
            .into_iter()
            .map(|profile| ProfileWithImages {
                images: by_profile.remove(&profile.id).unwrap_or_default(),
                profile,
            })
            .collect())
    }
}
