//! The generation pipeline.
//!
//! One run walks `Validating -> Allocating -> Generating -> Committing ->
//! Completed`. Validation failures end in `Rejected` with nothing touched.
//! A failed render, file write or commit ends in `Aborted`: every file the
//! run wrote is removed and no job, profile or credit change is persisted.
//!
//! Images are generated strictly one after another so progress events and
//! sequence indices are monotonic within a run.

use std::sync::Arc;

use chrono::Utc;
use persona_core::allocation::{self, JobRequest, ProfileSpec, ValidatedRequest};
use persona_core::error::CoreError;
use persona_core::expiry::{self, DEFAULT_RETENTION_DAYS};
use persona_core::progress::ProgressSnapshot;
use persona_core::prompts;
use persona_core::types::{new_entity_id, DbId, EntityId, Timestamp};
use persona_db::models::job::{CreateJob, Job};
use persona_db::models::profile::{CreateImage, CreateProfile};
use persona_imagegen::{ImageProvider, ImageSize};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PipelineError;
use crate::events::{ProgressSink, StreamEvent};
use crate::locks::UserLocks;
use crate::storage::{LocalImageStore, UndoLog};
use crate::store::{JobOwner, JobStore};

/// Tunables shared by every run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub retention_days: i64,
    pub image_size: ImageSize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            image_size: ImageSize::SquareHd,
        }
    }
}

/// Where a run is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Validating,
    Allocating,
    Generating { profile_index: u32, image_index: u32 },
    Committing,
    Completed,
    Rejected,
    Aborted,
}

/// Tracks and logs the state of one run.
struct Transitions {
    user_id: DbId,
    job_id: EntityId,
    state: PipelineState,
}

impl Transitions {
    fn enter(&mut self, next: PipelineState) {
        tracing::debug!(
            user_id = self.user_id,
            job_id = %self.job_id,
            from = ?self.state,
            to = ?next,
            "Pipeline state transition",
        );
        self.state = next;
    }
}

/// Runs generation jobs. Cheap to share behind an `Arc`.
pub struct GenerationPipeline {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn ImageProvider>,
    images: LocalImageStore,
    locks: UserLocks,
    settings: PipelineSettings,
}

impl GenerationPipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn ImageProvider>,
        images: LocalImageStore,
        locks: UserLocks,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            provider,
            images,
            locks,
            settings,
        }
    }

    /// Run one job for `user_id` with an OS-seeded random source.
    pub async fn run(
        &self,
        user_id: DbId,
        request: &JobRequest,
        sink: &dyn ProgressSink,
    ) -> Result<Job, PipelineError> {
        let mut rng = StdRng::from_os_rng();
        self.run_with_rng(user_id, request, sink, &mut rng).await
    }

    /// Run one job, drawing post counts and prompts from `rng`.
    ///
    /// Emits progress events while generating and exactly one terminal
    /// event (`complete` or `error`) before returning.
    pub async fn run_with_rng<R: Rng + Send>(
        &self,
        user_id: DbId,
        request: &JobRequest,
        sink: &dyn ProgressSink,
        rng: &mut R,
    ) -> Result<Job, PipelineError> {
        let started_at = Utc::now();
        let mut run = Transitions {
            user_id,
            job_id: new_entity_id(),
            state: PipelineState::Validating,
        };

        let (validated, owner) = match self.validate(user_id, request).await {
            Ok(checked) => checked,
            Err(e) => {
                run.enter(PipelineState::Rejected);
                tracing::warn!(user_id, error = %e, "Job request rejected");
                sink.emit(StreamEvent::error(e.client_message())).await;
                return Err(e);
            }
        };

        run.enter(PipelineState::Allocating);
        let specs = allocation::allocate(&validated, rng);
        tracing::info!(
            user_id,
            job_id = %run.job_id,
            num_profiles = validated.num_profiles,
            max_images = validated.max_images(),
            "Starting generation job",
        );

        let mut undo = UndoLog::new();
        let profiles = match self
            .generate(&mut run, &owner, &validated, &specs, sink, rng, &mut undo)
            .await
        {
            Ok(profiles) => profiles,
            Err(e) => return Err(self.abort(&mut run, e, undo, sink).await),
        };

        run.enter(PipelineState::Committing);
        let job = self.build_job(run.job_id, started_at, &validated, &profiles);
        let committed = {
            let _guard = self.locks.lock(user_id).await;
            self.store.commit(user_id, &job, &profiles).await
        };

        match committed {
            Ok(job) => {
                run.enter(PipelineState::Completed);
                tracing::info!(
                    user_id,
                    job_id = %job.id,
                    credits_used = job.credits_used,
                    "Generation job completed",
                );
                sink.emit(StreamEvent::complete()).await;
                Ok(job)
            }
            Err(e) => Err(self.abort(&mut run, e.into(), undo, sink).await),
        }
    }

    /// Structural validation, owner lookup and the credit pre-flight.
    async fn validate(
        &self,
        user_id: DbId,
        request: &JobRequest,
    ) -> Result<(ValidatedRequest, JobOwner), PipelineError> {
        let validated = request.validate()?;
        let owner = self
            .store
            .load_owner(user_id)
            .await
            .map_err(|e| PipelineError::Persistence(e.into()))?
            .ok_or(PipelineError::UserNotFound(user_id))?;

        let max_cost = i64::from(validated.max_images());
        if i64::from(owner.credits) < max_cost {
            return Err(CoreError::Validation(format!(
                "Insufficient credits: job needs up to {max_cost}, {} available",
                owner.credits
            ))
            .into());
        }
        Ok((validated, owner))
    }

    /// Produce every profile in allocation order.
    #[allow(clippy::too_many_arguments)]
    async fn generate<R: Rng + Send>(
        &self,
        run: &mut Transitions,
        owner: &JobOwner,
        validated: &ValidatedRequest,
        specs: &[ProfileSpec],
        sink: &dyn ProgressSink,
        rng: &mut R,
        undo: &mut UndoLog,
    ) -> Result<Vec<CreateProfile>, PipelineError> {
        let total_images = validated.max_images();
        let total_profiles = validated.num_profiles;
        let mut images_done: u32 = 0;
        let mut sequence_index = owner.existing_images;
        let mut profiles = Vec::with_capacity(specs.len());

        for spec in specs {
            let created_at = Utc::now();
            let mut profile = CreateProfile {
                id: new_entity_id(),
                job_id: Some(run.job_id),
                picture_category: spec.category,
                post_count: spec.post_count as i32,
                created_at,
                expires_at: expiry::expires_at(created_at, self.settings.retention_days),
                images: Vec::new(),
            };

            let kinds = spec
                .has_picture
                .then_some(false)
                .into_iter()
                .chain(std::iter::repeat_n(true, spec.post_count as usize));

            for (image_index, is_post) in kinds.enumerate() {
                run.enter(PipelineState::Generating {
                    profile_index: spec.slot,
                    image_index: image_index as u32,
                });

                let image = self
                    .render_one(owner, &profile, sequence_index, is_post, rng, undo)
                    .await?;
                tracing::info!(
                    user_id = owner.id,
                    job_id = %run.job_id,
                    profile_id = %profile.id,
                    sequence_index,
                    is_post,
                    "Image generated",
                );
                profile.images.push(image);
                images_done += 1;
                sequence_index += 1;

                sink.emit(StreamEvent::Progress {
                    profile: profile.clone(),
                    progress: ProgressSnapshot::compute(
                        images_done,
                        total_images,
                        spec.slot,
                        total_profiles,
                    ),
                })
                .await;
            }

            // A profile with neither picture nor posts still shows up once.
            if profile.images.is_empty() {
                sink.emit(StreamEvent::Progress {
                    profile: profile.clone(),
                    progress: ProgressSnapshot::compute(
                        images_done,
                        total_images,
                        spec.slot,
                        total_profiles,
                    ),
                })
                .await;
            }

            profiles.push(profile);
        }

        Ok(profiles)
    }

    /// Pick a prompt, render it and write the file.
    async fn render_one<R: Rng + Send>(
        &self,
        owner: &JobOwner,
        profile: &CreateProfile,
        sequence_index: u32,
        is_post: bool,
        rng: &mut R,
        undo: &mut UndoLog,
    ) -> Result<CreateImage, PipelineError> {
        let category = profile.picture_category;
        let prompt = prompts::choose(category, is_post, rng);
        let bytes = self
            .provider
            .render(prompt, self.settings.image_size)
            .await?;

        let location =
            self.images
                .locate(&owner.username, profile.id, category, sequence_index, is_post);
        self.images.write(&location, &bytes, undo).await?;

        Ok(CreateImage {
            storage_path: location.storage_path.to_string_lossy().into_owned(),
            public_url: location.public_url,
            category,
            sequence_index: sequence_index as i32,
            is_post,
            prompt: prompt.to_string(),
            generated_at: Utc::now(),
        })
    }

    /// The job row is stamped now, after generation, so its lifetime starts
    /// no earlier than that of any profile it owns. `started_at` keeps the
    /// time the request arrived.
    fn build_job(
        &self,
        job_id: EntityId,
        started_at: Timestamp,
        validated: &ValidatedRequest,
        profiles: &[CreateProfile],
    ) -> CreateJob {
        let credits_used: usize = profiles.iter().map(|p| p.images.len()).sum();
        let created_at = Utc::now();
        CreateJob {
            id: job_id,
            created_at,
            started_at,
            expires_at: expiry::expires_at(created_at, self.settings.retention_days),
            num_profiles: validated.num_profiles as i32,
            profiles_with_pics: validated.profiles_with_pics as i32,
            profiles_with_posts: validated.profiles_with_posts as i32,
            min_posts_per_profile: validated.min_posts_per_profile as i32,
            max_posts_per_profile: validated.max_posts_per_profile as i32,
            picture_type_distribution: validated.picture_type_distribution.clone(),
            credits_used: credits_used as i32,
        }
    }

    /// Undo the run's files, then report `error` on the stream.
    async fn abort(
        &self,
        run: &mut Transitions,
        error: PipelineError,
        undo: UndoLog,
        sink: &dyn ProgressSink,
    ) -> PipelineError {
        run.enter(PipelineState::Aborted);
        tracing::error!(
            user_id = run.user_id,
            job_id = %run.job_id,
            error = %error,
            files_written = undo.files().count(),
            "Generation job aborted",
        );

        let report = undo.rollback().await;
        if report.failed > 0 {
            tracing::warn!(
                job_id = %run.job_id,
                removed = report.removed,
                failed = report.failed,
                "Cleanup after abort left files behind",
            );
        }

        sink.emit(StreamEvent::error(error.client_message())).await;
        error
    }
}
