//! Progress snapshot math for streamed job updates.
//!
//! The denominator is the job's *maximum* image count (every post slot at
//! `max_posts_per_profile`), not the realised post counts, so a job whose
//! rolls came in low finishes below 100%. The completion event stands in for
//! the final 100%.

use serde::Serialize;

/// Progress figures sent with every streamed profile update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// `round(100 * current_picture / total_pictures)`, capped at 100.
    pub progress: u32,
    /// Images generated so far in this run.
    pub current_picture: u32,
    /// Maximum images the job can produce.
    pub total_pictures: u32,
    /// 1-based index of the profile being generated.
    pub current_profile: u32,
    pub total_profiles: u32,
    pub remaining_profiles: u32,
    pub remaining_pictures: u32,
}

impl ProgressSnapshot {
    /// Build a snapshot after `images_done` images, while working on the
    /// zero-based `profile_index`.
    pub fn compute(
        images_done: u32,
        total_pictures: u32,
        profile_index: u32,
        total_profiles: u32,
    ) -> Self {
        let progress = if total_pictures == 0 {
            100
        } else {
            let rounded = (f64::from(images_done) * 100.0 / f64::from(total_pictures)).round();
            (rounded as u32).min(100)
        };
        let current_profile = profile_index + 1;

        Self {
            progress,
            current_picture: images_done,
            total_pictures,
            current_profile,
            total_profiles,
            remaining_profiles: total_profiles.saturating_sub(current_profile),
            remaining_pictures: total_pictures.saturating_sub(images_done),
        }
    }
}
