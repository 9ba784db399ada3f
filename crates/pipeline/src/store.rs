//! Persistence seams for the pipeline and the reaper, plus their
//! PostgreSQL implementation.

use async_trait::async_trait;
use persona_core::expiry::{ExpiryPlan, JobStamp, ProfileStamp};
use persona_core::types::{DbId, EntityId};
use persona_db::models::job::{CreateJob, Job};
use persona_db::models::profile::CreateProfile;
use persona_db::repositories::{
    CommitError, ImageRepo, JobRepo, ProfileRepo, PurgeCounts, UserRepo,
};
use sqlx::PgPool;

/// What the pipeline needs to know about the user submitting a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOwner {
    pub id: DbId,
    pub username: String,
    pub credits: i32,
    /// Images the user already owns; seeds the run's sequence counter.
    pub existing_images: u32,
}

/// Reads and writes done by a generation run.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn load_owner(&self, user_id: DbId) -> Result<Option<JobOwner>, sqlx::Error>;

    /// Persist the job, its profiles and images, and debit the user, all or
    /// nothing.
    async fn commit(
        &self,
        user_id: DbId,
        job: &CreateJob,
        profiles: &[CreateProfile],
    ) -> Result<Job, CommitError>;
}

/// Reads and deletes done by the expiry sweep.
#[async_trait]
pub trait ExpiryStore: Send + Sync {
    /// `(id, username)` of every user.
    async fn list_users(&self) -> Result<Vec<(DbId, String)>, sqlx::Error>;
    async fn job_stamps(&self, user_id: DbId) -> Result<Vec<JobStamp>, sqlx::Error>;
    async fn profile_stamps(&self, user_id: DbId) -> Result<Vec<ProfileStamp>, sqlx::Error>;
    /// Storage paths of every image belonging to `profile_ids`.
    async fn image_paths(&self, profile_ids: &[EntityId]) -> Result<Vec<String>, sqlx::Error>;
    async fn purge(&self, user_id: DbId, plan: &ExpiryPlan) -> Result<PurgeCounts, sqlx::Error>;
}

/// [`JobStore`] and [`ExpiryStore`] over the repositories.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn load_owner(&self, user_id: DbId) -> Result<Option<JobOwner>, sqlx::Error> {
        let Some(user) = UserRepo::find_by_id(&self.pool, user_id).await? else {
            return Ok(None);
        };
        let existing = ImageRepo::count_for_user(&self.pool, user_id).await?;
        Ok(Some(JobOwner {
            id: user.id,
            username: user.username,
            credits: user.credits,
            existing_images: u32::try_from(existing).unwrap_or(u32::MAX),
        }))
    }

    async fn commit(
        &self,
        user_id: DbId,
        job: &CreateJob,
        profiles: &[CreateProfile],
    ) -> Result<Job, CommitError> {
        JobRepo::commit_generation(&self.pool, user_id, job, profiles).await
    }
}

#[async_trait]
impl ExpiryStore for PgStore {
    async fn list_users(&self) -> Result<Vec<(DbId, String)>, sqlx::Error> {
        UserRepo::list_identities(&self.pool).await
    }

    async fn job_stamps(&self, user_id: DbId) -> Result<Vec<JobStamp>, sqlx::Error> {
        JobRepo::list_stamps_for_user(&self.pool, user_id).await
    }

    async fn profile_stamps(&self, user_id: DbId) -> Result<Vec<ProfileStamp>, sqlx::Error> {
        ProfileRepo::list_stamps_for_user(&self.pool, user_id).await
    }

    async fn image_paths(&self, profile_ids: &[EntityId]) -> Result<Vec<String>, sqlx::Error> {
        ImageRepo::storage_paths_for_profiles(&self.pool, profile_ids).await
    }

    async fn purge(&self, user_id: DbId, plan: &ExpiryPlan) -> Result<PurgeCounts, sqlx::Error> {
        JobRepo::purge(&self.pool, user_id, plan).await
    }
}
