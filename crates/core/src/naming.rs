//! Storage layout for generated images.
//!
//! Files live under `{root}/profile_pictures/{username}/{profile_id}/` and
//! are served at `/uploads/profile_pictures/{username}/{profile_id}/`. The
//! filesystem path and public URL are always derived together so they never
//! drift apart.

use std::path::{Path, PathBuf};

use crate::category::PictureCategory;
use crate::types::EntityId;

/// Directory under the uploads root that holds every user's images.
pub const PROFILE_PICTURES_DIR: &str = "profile_pictures";

/// URL prefix the uploads root is mounted at.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Archive entry name for a profile's picture.
pub const ARCHIVE_PICTURE_NAME: &str = "profile_picture.jpg";

/// Where one image lives on disk and on the web.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation {
    pub storage_path: PathBuf,
    pub public_url: String,
    pub file_name: String,
}

/// `{profile|post}_{category}_{sequence_index}.jpg`
pub fn image_file_name(category: PictureCategory, sequence_index: u32, is_post: bool) -> String {
    let prefix = if is_post { "post" } else { "profile" };
    format!("{prefix}_{category}_{sequence_index}.jpg")
}

/// Per-user directory under the uploads root.
pub fn user_dir(root: &Path, username: &str) -> PathBuf {
    root.join(PROFILE_PICTURES_DIR).join(username)
}

/// Per-profile directory under the uploads root.
pub fn profile_dir(root: &Path, username: &str, profile_id: EntityId) -> PathBuf {
    user_dir(root, username).join(profile_id.to_string())
}

/// Derive both the storage path and the public URL for an image.
pub fn image_location(
    root: &Path,
    username: &str,
    profile_id: EntityId,
    category: PictureCategory,
    sequence_index: u32,
    is_post: bool,
) -> ImageLocation {
    let file_name = image_file_name(category, sequence_index, is_post);
    ImageLocation {
        storage_path: profile_dir(root, username, profile_id).join(&file_name),
        public_url: format!(
            "{UPLOADS_URL_PREFIX}/{PROFILE_PICTURES_DIR}/{username}/{profile_id}/{file_name}"
        ),
        file_name,
    }
}

/// Archive entry name for the `n`th (1-based) post of a profile.
pub fn archive_post_name(n: usize) -> String {
    format!("post{n}.jpg")
}

/// Archive folder for the `n`th (1-based) profile of a job.
pub fn archive_profile_folder(n: usize) -> String {
    format!("profile{n}")
}
