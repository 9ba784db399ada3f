//! Local filesystem storage for generated images.
//!
//! Every file and directory a run creates is recorded in an [`UndoLog`].
//! If the run aborts, the log is replayed in reverse. Undo steps are
//! best-effort: failures are logged and the remaining steps still run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use persona_core::naming::{self, ImageLocation};
use persona_core::types::EntityId;

/// One reversible side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UndoStep {
    /// A file written by this run.
    File(PathBuf),
    /// A directory created by this run. Only removed if empty.
    Dir(PathBuf),
}

/// Ordered record of what a run created on disk.
#[derive(Debug, Default)]
pub struct UndoLog {
    steps: Vec<UndoStep>,
}

/// Outcome of replaying an [`UndoLog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub removed: usize,
    pub failed: usize,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Files recorded so far, in write order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.steps.iter().filter_map(|step| match step {
            UndoStep::File(path) => Some(path.as_path()),
            UndoStep::Dir(_) => None,
        })
    }

    fn record_file(&mut self, path: PathBuf) {
        self.steps.push(UndoStep::File(path));
    }

    fn record_dir(&mut self, path: PathBuf) {
        self.steps.push(UndoStep::Dir(path));
    }

    /// Undo every recorded step, newest first.
    pub async fn rollback(self) -> RollbackReport {
        let mut report = RollbackReport::default();
        for step in self.steps.into_iter().rev() {
            let (path, result) = match step {
                UndoStep::File(path) => {
                    let result = tokio::fs::remove_file(&path).await;
                    (path, result)
                }
                UndoStep::Dir(path) => {
                    let result = tokio::fs::remove_dir(&path).await;
                    (path, result)
                }
            };
            match result {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(path = %path.display(), error = %e, "Rollback step failed");
                }
            }
        }
        report
    }
}

/// Image storage rooted at the uploads directory.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where an image for this profile would be stored.
    pub fn locate(
        &self,
        username: &str,
        profile_id: EntityId,
        category: persona_core::category::PictureCategory,
        sequence_index: u32,
        is_post: bool,
    ) -> ImageLocation {
        naming::image_location(
            &self.root,
            username,
            profile_id,
            category,
            sequence_index,
            is_post,
        )
    }

    /// Write `bytes` to `location`, creating parent directories as needed.
    /// Every directory and the file itself are recorded in `undo`, the file
    /// before the write starts so a partial one left by a failure is undone.
    pub async fn write(
        &self,
        location: &ImageLocation,
        bytes: &[u8],
        undo: &mut UndoLog,
    ) -> std::io::Result<()> {
        if let Some(parent) = location.storage_path.parent() {
            self.create_dirs(parent, undo).await?;
        }
        undo.record_file(location.storage_path.clone());
        tokio::fs::write(&location.storage_path, bytes).await
    }

    /// Delete one stored file. Returns `false` if it could not be removed;
    /// a file that is already gone counts as removed.
    pub async fn remove_file(&self, path: &Path) -> bool {
        match tokio::fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete image file");
                false
            }
        }
    }

    /// Remove `dir` if it exists and is empty. Returns whether it was removed.
    pub async fn prune_dir(&self, dir: &Path) -> bool {
        match tokio::fs::read_dir(dir).await {
            Ok(mut entries) => match entries.next_entry().await {
                Ok(None) => {}
                Ok(Some(_)) => return false,
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "Failed to list directory");
                    return false;
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => return false,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to open directory");
                return false;
            }
        }
        match tokio::fs::remove_dir(dir).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to remove empty directory"
                );
                false
            }
        }
    }

    /// Create `dir` and any missing ancestors below the uploads root,
    /// recording the ones this call created, outermost first.
    async fn create_dirs(&self, dir: &Path, undo: &mut UndoLog) -> std::io::Result<()> {
        let mut missing = Vec::new();
        let mut cursor = Some(dir);
        while let Some(path) = cursor {
            if path == self.root || tokio::fs::try_exists(path).await? {
                break;
            }
            missing.push(path.to_path_buf());
            cursor = path.parent();
        }

        for path in missing.into_iter().rev() {
            match tokio::fs::create_dir(&path).await {
                Ok(()) => undo.record_dir(path),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // Uploads root itself is missing; create it without
                    // tracking, it outlives any single run.
                    tokio::fs::create_dir_all(path.parent().unwrap_or(&self.root)).await?;
                    tokio::fs::create_dir(&path).await?;
                    undo.record_dir(path);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
