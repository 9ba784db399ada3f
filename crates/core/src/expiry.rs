//! Expiry rules for jobs and profiles.
//!
//! A profile's `job_id` is a weak reference: nothing guarantees the job
//! exists. Resolution is a lookup by id. A profile goes when its own
//! `expires_at` has passed, or when it points at a job that is expiring in
//! the same sweep, whatever its own stamp says.

use std::collections::HashSet;

use chrono::Duration;

use crate::types::{EntityId, Timestamp};

/// Default lifetime of jobs and profiles.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Expiry stamp for an entity created at `created_at`.
pub fn expires_at(created_at: Timestamp, retention_days: i64) -> Timestamp {
    created_at + Duration::days(retention_days)
}

/// Whether an entity stamped `expires_at` is still visible at `now`.
pub fn is_active(expires_at: Timestamp, now: Timestamp) -> bool {
    expires_at > now
}

/// The fields of a job the sweep needs.
#[derive(Debug, Clone, Copy)]
pub struct JobStamp {
    pub id: EntityId,
    pub expires_at: Timestamp,
}

/// The fields of a profile the sweep needs.
#[derive(Debug, Clone, Copy)]
pub struct ProfileStamp {
    pub id: EntityId,
    pub job_id: Option<EntityId>,
    pub expires_at: Timestamp,
}

/// What one user's sweep removes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiryPlan {
    pub expired_jobs: Vec<EntityId>,
    pub expired_profiles: Vec<EntityId>,
}

impl ExpiryPlan {
    pub fn is_empty(&self) -> bool {
        self.expired_jobs.is_empty() && self.expired_profiles.is_empty()
    }
}

/// Decide which of a user's jobs and profiles expire at `now`.
///
/// Jobs with `expires_at <= now` expire. Profiles expire on their own stamp
/// or by cascade from an expiring job. Input order is preserved.
pub fn plan_expiry(jobs: &[JobStamp], profiles: &[ProfileStamp], now: Timestamp) -> ExpiryPlan {
    let expired_jobs: Vec<EntityId> = jobs
        .iter()
        .filter(|job| job.expires_at <= now)
        .map(|job| job.id)
        .collect();
    let expired_set: HashSet<EntityId> = expired_jobs.iter().copied().collect();

    let expired_profiles = profiles
        .iter()
        .filter(|profile| {
            profile.expires_at <= now
                || profile
                    .job_id
                    .is_some_and(|job_id| expired_set.contains(&job_id))
        })
        .map(|profile| profile.id)
        .collect();

    ExpiryPlan {
        expired_jobs,
        expired_profiles,
    }
}
