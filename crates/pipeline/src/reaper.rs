//! Expiry sweep over every user's jobs, profiles and image files.
//!
//! Per user: plan which jobs and profiles expire, delete the image files of
//! the expiring profiles, purge the rows, then prune profile directories and
//! the user directory if they ended up empty. File problems are logged and
//! skipped; one bad user does not stop the sweep for the others.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use persona_core::expiry::plan_expiry;
use persona_core::naming;
use persona_core::types::{DbId, Timestamp};

use crate::locks::UserLocks;
use crate::storage::LocalImageStore;
use crate::store::ExpiryStore;

/// Totals from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub users_swept: usize,
    pub users_failed: usize,
    pub jobs_removed: u64,
    pub profiles_removed: u64,
    pub files_removed: usize,
    pub files_failed: usize,
}

impl SweepReport {
    fn absorb(&mut self, other: SweepReport) {
        self.users_swept += other.users_swept;
        self.users_failed += other.users_failed;
        self.jobs_removed += other.jobs_removed;
        self.profiles_removed += other.profiles_removed;
        self.files_removed += other.files_removed;
        self.files_failed += other.files_failed;
    }
}

pub struct ExpiryReaper {
    store: Arc<dyn ExpiryStore>,
    images: LocalImageStore,
    locks: UserLocks,
}

impl ExpiryReaper {
    pub fn new(store: Arc<dyn ExpiryStore>, images: LocalImageStore, locks: UserLocks) -> Self {
        Self {
            store,
            images,
            locks,
        }
    }

    /// Sweep every user as of `now`.
    pub async fn sweep_all(&self, now: Timestamp) -> Result<SweepReport, sqlx::Error> {
        let users = self.store.list_users().await?;
        let mut total = SweepReport::default();

        for (user_id, username) in users {
            match self.sweep_user(user_id, &username, now).await {
                Ok(report) => total.absorb(report),
                Err(e) => {
                    total.users_failed += 1;
                    tracing::error!(user_id, error = %e, "Expiry sweep failed for user");
                }
            }
        }
        Ok(total)
    }

    /// Sweep one user as of `now`, holding that user's write lock.
    pub async fn sweep_user(
        &self,
        user_id: DbId,
        username: &str,
        now: Timestamp,
    ) -> Result<SweepReport, sqlx::Error> {
        let _guard = self.locks.lock(user_id).await;
        let mut report = SweepReport {
            users_swept: 1,
            ..SweepReport::default()
        };

        let jobs = self.store.job_stamps(user_id).await?;
        let profiles = self.store.profile_stamps(user_id).await?;
        let plan = plan_expiry(&jobs, &profiles, now);

        if !plan.is_empty() {
            let paths = self.store.image_paths(&plan.expired_profiles).await?;
            let mut dirs: HashSet<PathBuf> = plan
                .expired_profiles
                .iter()
                .map(|&id| naming::profile_dir(self.images.root(), username, id))
                .collect();

            for path in &paths {
                let path = Path::new(path);
                if self.images.remove_file(path).await {
                    report.files_removed += 1;
                } else {
                    report.files_failed += 1;
                }
                if let Some(parent) = path.parent() {
                    dirs.insert(parent.to_path_buf());
                }
            }

            let counts = self.store.purge(user_id, &plan).await?;
            report.jobs_removed = counts.jobs;
            report.profiles_removed = counts.profiles;

            for dir in &dirs {
                self.images.prune_dir(dir).await;
            }

            tracing::info!(
                user_id,
                jobs = counts.jobs,
                profiles = counts.profiles,
                files = report.files_removed,
                files_failed = report.files_failed,
                "Expired entries purged",
            );
        }

        self.images
            .prune_dir(&naming::user_dir(self.images.root(), username))
            .await;

        Ok(report)
    }
}
