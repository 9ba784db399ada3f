//! Shared fakes for pipeline and reaper integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use indexmap::IndexMap;
use persona_core::allocation::JobRequest;
use persona_core::expiry::{ExpiryPlan, JobStamp, ProfileStamp};
use persona_core::types::{DbId, EntityId};
use persona_db::models::job::{CreateJob, Job};
use persona_db::models::profile::CreateProfile;
use persona_db::repositories::{CommitError, PurgeCounts};
use persona_imagegen::{ImageGenError, ImageProvider, ImageSize};
use persona_pipeline::{
    ExpiryStore, GenerationPipeline, JobOwner, JobStore, LocalImageStore, PipelineSettings,
    ProgressSink, StreamEvent, UserLocks,
};
use sqlx::types::Json;

/// Minimal JPEG header; enough for anything sniffing the format.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

pub const USER_ID: DbId = 1;
pub const USERNAME: &str = "alice";

// ---------------------------------------------------------------------------
// Image provider
// ---------------------------------------------------------------------------

/// Returns fixed bytes, optionally failing on the `fail_on`th call (1-based).
#[derive(Default)]
pub struct ScriptedProvider {
    calls: AtomicUsize,
    fail_on: Option<usize>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn render(&self, prompt: &str, _size: ImageSize) -> Result<Vec<u8>, ImageGenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_on == Some(call) {
            return Err(ImageGenError::InvalidResponse("scripted failure".into()));
        }
        Ok(JPEG_BYTES.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    users: HashMap<DbId, (String, i32)>,
    jobs: Vec<(DbId, Job)>,
    profiles: Vec<(DbId, CreateProfile)>,
    fail_commit: bool,
}

/// In-memory stand-in for the database.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_user(user_id: DbId, username: &str, credits: i32) -> Self {
        let store = Self::default();
        store
            .state
            .lock()
            .unwrap()
            .users
            .insert(user_id, (username.to_string(), credits));
        store
    }

    pub fn fail_commits(&self) {
        self.state.lock().unwrap().fail_commit = true;
    }

    pub fn credits(&self, user_id: DbId) -> i32 {
        self.state.lock().unwrap().users[&user_id].1
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.state.lock().unwrap().jobs.iter().map(|(_, j)| j.clone()).collect()
    }

    pub fn profiles(&self) -> Vec<CreateProfile> {
        self.state
            .lock()
            .unwrap()
            .profiles
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn insert_job(&self, user_id: DbId, job: Job) {
        self.state.lock().unwrap().jobs.push((user_id, job));
    }

    pub fn insert_profile(&self, user_id: DbId, profile: CreateProfile) {
        self.state.lock().unwrap().profiles.push((user_id, profile));
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn load_owner(&self, user_id: DbId) -> Result<Option<JobOwner>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let Some((username, credits)) = state.users.get(&user_id) else {
            return Ok(None);
        };
        let existing_images = state
            .profiles
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, p)| p.images.len() as u32)
            .sum();
        Ok(Some(JobOwner {
            id: user_id,
            username: username.clone(),
            credits: *credits,
            existing_images,
        }))
    }

    async fn commit(
        &self,
        user_id: DbId,
        job: &CreateJob,
        profiles: &[CreateProfile],
    ) -> Result<Job, CommitError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_commit {
            return Err(CommitError::Database(sqlx::Error::PoolTimedOut));
        }
        let credits_before = state
            .users
            .get(&user_id)
            .map(|(_, c)| *c)
            .ok_or(CommitError::UserMissing(user_id))?;
        if credits_before < job.credits_used {
            return Err(CommitError::InsufficientCredits {
                available: credits_before,
                required: job.credits_used,
            });
        }

        let row = Job {
            id: job.id,
            user_id,
            created_at: job.created_at,
            started_at: job.started_at,
            expires_at: job.expires_at,
            num_profiles: job.num_profiles,
            profiles_with_pics: job.profiles_with_pics,
            profiles_with_posts: job.profiles_with_posts,
            min_posts_per_profile: job.min_posts_per_profile,
            max_posts_per_profile: job.max_posts_per_profile,
            picture_type_distribution: Json(job.picture_type_distribution.clone()),
            credits_before_job: credits_before,
            credits_used: job.credits_used,
            credits_after_job: credits_before - job.credits_used,
        };
        if let Some(user) = state.users.get_mut(&user_id) {
            user.1 = row.credits_after_job;
        }
        state.jobs.push((user_id, row.clone()));
        state
            .profiles
            .extend(profiles.iter().cloned().map(|p| (user_id, p)));
        Ok(row)
    }
}

#[async_trait]
impl ExpiryStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<(DbId, String)>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut users: Vec<_> = state
            .users
            .iter()
            .map(|(id, (name, _))| (*id, name.clone()))
            .collect();
        users.sort();
        Ok(users)
    }

    async fn job_stamps(&self, user_id: DbId) -> Result<Vec<JobStamp>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .jobs
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, j)| JobStamp {
                id: j.id,
                expires_at: j.expires_at,
            })
            .collect())
    }

    async fn profile_stamps(&self, user_id: DbId) -> Result<Vec<ProfileStamp>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .profiles
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, p)| ProfileStamp {
                id: p.id,
                job_id: p.job_id,
                expires_at: p.expires_at,
            })
            .collect())
    }

    async fn image_paths(&self, profile_ids: &[EntityId]) -> Result<Vec<String>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .profiles
            .iter()
            .filter(|(_, p)| profile_ids.contains(&p.id))
            .flat_map(|(_, p)| p.images.iter().map(|i| i.storage_path.clone()))
            .collect())
    }

    async fn purge(&self, user_id: DbId, plan: &ExpiryPlan) -> Result<PurgeCounts, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let jobs_before = state.jobs.len();
        state
            .jobs
            .retain(|(owner, j)| !(*owner == user_id && plan.expired_jobs.contains(&j.id)));
        let profiles_before = state.profiles.len();
        state
            .profiles
            .retain(|(owner, p)| !(*owner == user_id && plan.expired_profiles.contains(&p.id)));
        Ok(PurgeCounts {
            jobs: (jobs_before - state.jobs.len()) as u64,
            profiles: (profiles_before - state.profiles.len()) as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Collects every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StreamEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn emit(&self, event: StreamEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn pipeline(
    store: Arc<MemoryStore>,
    provider: Arc<ScriptedProvider>,
    root: &Path,
) -> GenerationPipeline {
    GenerationPipeline::new(
        store,
        provider,
        LocalImageStore::new(root),
        UserLocks::new(),
        PipelineSettings::default(),
    )
}

pub fn request(
    num_profiles: i64,
    profiles_with_pics: i64,
    distribution: &[(&str, i64)],
    profiles_with_posts: i64,
    min_posts: i64,
    max_posts: i64,
) -> JobRequest {
    JobRequest {
        num_profiles,
        profiles_with_pics,
        picture_type_distribution: distribution
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect::<IndexMap<_, _>>(),
        profiles_with_posts,
        min_posts_per_profile: min_posts,
        max_posts_per_profile: max_posts,
    }
}

/// Every regular file under `dir`, recursively.
pub fn files_under(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(files_under(&path));
        } else {
            out.push(path);
        }
    }
    out.sort();
    out
}
