//! Handlers for the `/jobs` resource: listing and archive download.

use std::io::{Cursor, Write};
use std::path::PathBuf;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use persona_core::error::CoreError;
use persona_core::naming;
use persona_core::types::EntityId;
use persona_db::models::job::JobWithProfiles;
use persona_db::models::profile::ProfileWithImages;
use persona_db::repositories::{JobRepo, ProfileRepo};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/jobs
///
/// Non-expired jobs, newest first, each with the profiles that still
/// resolve to it.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let jobs = JobRepo::list_active_for_user(&state.pool, auth.user_id, now).await?;
    let job_ids: Vec<EntityId> = jobs.iter().map(|j| j.id).collect();
    let mut profiles =
        ProfileRepo::list_active_for_jobs(&state.pool, auth.user_id, &job_ids, now).await?;

    let data: Vec<JobWithProfiles> = jobs
        .into_iter()
        .map(|job| {
            let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut profiles)
                .into_iter()
                .partition(|p| p.profile.job_id == Some(job.id));
            profiles = rest;
            JobWithProfiles {
                job,
                profiles: mine,
            }
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/jobs/{id}/download
///
/// Zip of every still-resolvable profile of the job. Unknown, foreign and
/// expired jobs are all reported as not found.
pub async fn download(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let job = JobRepo::find_active_for_user(&state.pool, auth.user_id, job_id, now)
        .await?
        .ok_or_else(|| CoreError::not_found("Job", job_id))?;
    let profiles =
        ProfileRepo::list_active_for_jobs(&state.pool, auth.user_id, &[job.id], now).await?;

    let entries = archive_entries(&profiles);
    let bytes = tokio::task::spawn_blocking(move || build_archive(entries))
        .await
        .map_err(|e| AppError::InternalError(format!("Archive task failed: {e}")))??;

    tracing::info!(
        user_id = auth.user_id,
        job_id = %job.id,
        size = bytes.len(),
        "Job archive built"
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/zip".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"profiles-{}.zip\"", job.id),
            ),
        ],
        bytes,
    ))
}

/// One file to copy into the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub source: PathBuf,
}

/// Lay out archive entries: `profile{n}/profile_picture.jpg` and
/// `profile{n}/post{k}.jpg`, both 1-based and in stored order.
pub fn archive_entries(profiles: &[ProfileWithImages]) -> Vec<ArchiveEntry> {
    let mut entries = Vec::new();
    for (i, profile) in profiles.iter().enumerate() {
        let folder = naming::archive_profile_folder(i + 1);
        if let Some(picture) = profile.picture() {
            entries.push(ArchiveEntry {
                name: format!("{folder}/{}", naming::ARCHIVE_PICTURE_NAME),
                source: PathBuf::from(&picture.storage_path),
            });
        }
        for (k, post) in profile.posts().enumerate() {
            entries.push(ArchiveEntry {
                name: format!("{folder}/{}", naming::archive_post_name(k + 1)),
                source: PathBuf::from(&post.storage_path),
            });
        }
    }
    entries
}

/// Write `entries` into an in-memory zip. JPEGs are already compressed, so
/// they are stored as-is. Missing source files are skipped.
fn build_archive(entries: Vec<ArchiveEntry>) -> AppResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for entry in entries {
        let bytes = match std::fs::read(&entry.source) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    path = %entry.source.display(),
                    error = %e,
                    "Skipping missing image in archive",
                );
                continue;
            }
        };
        zip.start_file(entry.name, options)?;
        zip.write_all(&bytes)
            .map_err(|e| AppError::InternalError(format!("Archive write failed: {e}")))?;
    }

    Ok(zip.finish()?.into_inner())
}
