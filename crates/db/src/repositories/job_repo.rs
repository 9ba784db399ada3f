//! Repository for the `jobs` table.
//!
//! A job row only ever appears through [`JobRepo::commit_generation`], which
//! writes the job, its profiles and images, and the credit debit in one
//! transaction. Failed runs leave no trace here.

use persona_core::expiry::{ExpiryPlan, JobStamp};
use persona_core::types::{DbId, EntityId, Timestamp};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::job::{CreateJob, Job};
use crate::models::profile::CreateProfile;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, user_id, created_at, started_at, expires_at, \
    num_profiles, profiles_with_pics, profiles_with_posts, \
    min_posts_per_profile, max_posts_per_profile, picture_type_distribution, \
    credits_before_job, credits_used, credits_after_job";

/// Why a generation commit did not go through.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The balance dropped below the job's cost between pre-flight and commit.
    #[error("Insufficient credits: {available} available, {required} required")]
    InsufficientCredits { available: i32, required: i32 },

    #[error("User {0} no longer exists")]
    UserMissing(DbId),
}

/// Rows removed by one expiry purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub jobs: u64,
    pub profiles: u64,
}

/// Provides persistence for generation jobs.
pub struct JobRepo;

impl JobRepo {
    /// Atomically persist a finished run and debit the user.
    ///
    /// Locks the user row, records its balance as `credits_before_job`,
    /// inserts the job, profiles and images, then debits `credits_used`.
    pub async fn commit_generation(
        pool: &PgPool,
        user_id: DbId,
        job: &CreateJob,
        profiles: &[CreateProfile],
    ) -> Result<Job, CommitError> {
        let mut tx = pool.begin().await?;

        let credits_before: i32 =
            sqlx::query_scalar("SELECT credits FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CommitError::UserMissing(user_id))?;

        if credits_before < job.credits_used {
            return Err(CommitError::InsufficientCredits {
                available: credits_before,
                required: job.credits_used,
            });
        }

        let query = format!(
            "INSERT INTO jobs (
                id, user_id, created_at, started_at, expires_at,
                num_profiles, profiles_with_pics, profiles_with_posts,
                min_posts_per_profile, max_posts_per_profile, picture_type_distribution,
                credits_before_job, credits_used, credits_after_job
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, Job>(&query)
            .bind(job.id)
            .bind(user_id)
            .bind(job.created_at)
            .bind(job.started_at)
            .bind(job.expires_at)
            .bind(job.num_profiles)
            .bind(job.profiles_with_pics)
            .bind(job.profiles_with_posts)
            .bind(job.min_posts_per_profile)
            .bind(job.max_posts_per_profile)
            .bind(Json(&job.picture_type_distribution))
            .bind(credits_before)
            .bind(job.credits_used)
            .bind(credits_before - job.credits_used)
            .fetch_one(&mut *tx)
            .await?;

        for profile in profiles {
            Self::insert_profile(&mut tx, user_id, profile).await?;
        }

        let debited = sqlx::query(
            "UPDATE users SET credits = credits - $2 WHERE id = $1 AND credits >= $2",
        )
        .bind(user_id)
        .bind(job.credits_used)
        .execute(&mut *tx)
        .await?;
        if debited.rows_affected() == 0 {
            return Err(CommitError::InsufficientCredits {
                available: credits_before,
                required: job.credits_used,
            });
        }

        tx.commit().await?;

        tracing::info!(
            user_id,
            job_id = %row.id,
            credits_used = row.credits_used,
            credits_after = row.credits_after_job,
            "Generation job committed",
        );
        Ok(row)
    }

    /// Non-expired jobs of a user, newest first.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs
             WHERE user_id = $1 AND expires_at > $2
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// A single non-expired job owned by `user_id`.
    pub async fn find_active_for_user(
        pool: &PgPool,
        user_id: DbId,
        job_id: EntityId,
        now: Timestamp,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs
             WHERE id = $1 AND user_id = $2 AND expires_at > $3"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(user_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Expiry-relevant fields of every job a user owns.
    pub async fn list_stamps_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<JobStamp>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (EntityId, Timestamp)>(
            "SELECT id, expires_at FROM jobs WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, expires_at)| JobStamp { id, expires_at })
            .collect())
    }

    /// Delete the jobs and profiles named in `plan` in one transaction.
    /// Images go with their profiles via `ON DELETE CASCADE`.
    pub async fn purge(
        pool: &PgPool,
        user_id: DbId,
        plan: &ExpiryPlan,
    ) -> Result<PurgeCounts, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let profiles = sqlx::query("DELETE FROM profiles WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(&plan.expired_profiles)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let jobs = sqlx::query("DELETE FROM jobs WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(&plan.expired_jobs)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(PurgeCounts { jobs, profiles })
    }

    async fn insert_profile(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
        profile: &CreateProfile,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO profiles
                (id, user_id, job_id, picture_category, post_count, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(profile.id)
        .bind(user_id)
        .bind(profile.job_id)
        .bind(profile.picture_category.as_str())
        .bind(profile.post_count)
        .bind(profile.created_at)
        .bind(profile.expires_at)
        .execute(&mut **tx)
        .await?;

        for image in &profile.images {
            sqlx::query(
                "INSERT INTO images (
                    profile_id, storage_path, public_url, category,
                    sequence_index, is_post, prompt, generated_at
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(profile.id)
            .bind(&image.storage_path)
            .bind(&image.public_url)
            .bind(image.category.as_str())
            .bind(image.sequence_index)
            .bind(image.is_post)
            .bind(&image.prompt)
            .bind(image.generated_at)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}
