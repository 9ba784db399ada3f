//! Job request validation and profile-slot allocation.
//!
//! A job asks for `num_profiles` profiles. Pictures are all-or-nothing across
//! the job; when enabled, the distribution's categories are laid out in
//! insertion order over the lowest-indexed slots. Posts are likewise given to
//! the first `profiles_with_posts` slots, each with a post count rolled
//! uniformly in `[min_posts_per_profile, max_posts_per_profile]`.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::category::PictureCategory;
use crate::error::CoreError;

/// Upper bound on profiles in one job.
pub const MAX_PROFILES_PER_JOB: u32 = 500;

/// Upper bound on posts rolled for a single profile.
pub const MAX_POSTS_PER_PROFILE: u32 = 50;

/// Raw job request as submitted by the client. Nothing here is trusted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub num_profiles: i64,
    pub profiles_with_pics: i64,
    /// Category name -> profile count, in the order the client listed them.
    #[serde(default, alias = "picTypeDistribution")]
    pub picture_type_distribution: IndexMap<String, i64>,
    pub profiles_with_posts: i64,
    pub min_posts_per_profile: i64,
    pub max_posts_per_profile: i64,
}

/// A request that passed [`JobRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRequest {
    pub num_profiles: u32,
    pub profiles_with_pics: u32,
    /// Zero-count entries are dropped; order is preserved.
    pub picture_type_distribution: IndexMap<PictureCategory, u32>,
    pub profiles_with_posts: u32,
    pub min_posts_per_profile: u32,
    pub max_posts_per_profile: u32,
}

/// One profile slot as decided before any image is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSpec {
    /// Zero-based position within the job.
    pub slot: u32,
    pub category: PictureCategory,
    pub has_picture: bool,
    pub post_count: u32,
}

impl JobRequest {
    /// Check every structural rule and normalise the distribution.
    pub fn validate(&self) -> Result<ValidatedRequest, CoreError> {
        if self.num_profiles < 1 {
            return Err(CoreError::Validation("Invalid number of profiles".into()));
        }
        let num_profiles = bounded("numProfiles", self.num_profiles, MAX_PROFILES_PER_JOB)?;
        let profiles_with_pics =
            bounded("profilesWithPics", self.profiles_with_pics, num_profiles)?;

        if profiles_with_pics > 0 && profiles_with_pics != num_profiles {
            return Err(CoreError::Validation(
                "When profile pictures are enabled, all profiles must have pictures".into(),
            ));
        }

        let profiles_with_posts =
            bounded("profilesWithPosts", self.profiles_with_posts, num_profiles)?;
        let min_posts_per_profile = bounded(
            "minPostsPerProfile",
            self.min_posts_per_profile,
            MAX_POSTS_PER_PROFILE,
        )?;
        let max_posts_per_profile = bounded(
            "maxPostsPerProfile",
            self.max_posts_per_profile,
            MAX_POSTS_PER_PROFILE,
        )?;
        if min_posts_per_profile > max_posts_per_profile {
            return Err(CoreError::Validation(
                "minPostsPerProfile must not exceed maxPostsPerProfile".into(),
            ));
        }

        let mut picture_type_distribution = IndexMap::new();
        if profiles_with_pics > 0 {
            let mismatch = || {
                CoreError::Validation(
                    "Picture type distribution must match number of profiles with pictures".into(),
                )
            };
            let mut total: u32 = 0;
            for (name, &count) in &self.picture_type_distribution {
                let category = PictureCategory::from_name(name)?;
                if count < 0 {
                    return Err(CoreError::Validation(format!(
                        "Picture type count for '{name}' must not be negative"
                    )));
                }
                if count == 0 {
                    continue;
                }
                if count > i64::from(profiles_with_pics) {
                    return Err(mismatch());
                }
                let count = count as u32;
                total = total
                    .checked_add(count)
                    .filter(|&t| t <= profiles_with_pics)
                    .ok_or_else(mismatch)?;
                *picture_type_distribution.entry(category).or_insert(0) += count;
            }
            if total != profiles_with_pics {
                return Err(CoreError::Validation(
                    "Picture type distribution must match number of profiles with pictures".into(),
                ));
            }
        }

        Ok(ValidatedRequest {
            num_profiles,
            profiles_with_pics,
            picture_type_distribution,
            profiles_with_posts,
            min_posts_per_profile,
            max_posts_per_profile,
        })
    }
}

impl ValidatedRequest {
    /// Images the job could produce at most: one picture per picture slot
    /// plus `max_posts_per_profile` for every post slot.
    ///
    /// This is both the pre-flight credit bound and the progress denominator.
    pub fn max_images(&self) -> u32 {
        self.profiles_with_pics + self.profiles_with_posts * self.max_posts_per_profile
    }

    /// Flat category sequence of length `profiles_with_pics`, each category
    /// repeated `count` times in distribution order.
    pub fn picture_sequence(&self) -> Vec<PictureCategory> {
        self.picture_type_distribution
            .iter()
            .flat_map(|(&category, &count)| std::iter::repeat_n(category, count as usize))
            .collect()
    }
}

/// Lay out the job's profile slots in order.
///
/// Slots `[0, profiles_with_pics)` get pictures, slots
/// `[0, profiles_with_posts)` get posts. Slots without a picture use the
/// `random` category.
pub fn allocate<R: Rng + ?Sized>(request: &ValidatedRequest, rng: &mut R) -> Vec<ProfileSpec> {
    let sequence = request.picture_sequence();

    (0..request.num_profiles)
        .map(|slot| {
            let has_picture = slot < request.profiles_with_pics;
            let has_posts = slot < request.profiles_with_posts;
            let post_count = if has_posts {
                rng.random_range(request.min_posts_per_profile..=request.max_posts_per_profile)
            } else {
                0
            };
            let category = if has_picture {
                sequence[slot as usize]
            } else {
                PictureCategory::Random
            };
            ProfileSpec {
                slot,
                category,
                has_picture,
                post_count,
            }
        })
        .collect()
}

/// Convert a raw count to `u32`, rejecting negatives and values above `max`.
fn bounded(field: &str, value: i64, max: u32) -> Result<u32, CoreError> {
    if value < 0 {
        return Err(CoreError::Validation(format!(
            "{field} must not be negative"
        )));
    }
    if value > i64::from(max) {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max}"
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn request(
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
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            profiles_with_posts,
            min_posts_per_profile: min_posts,
            max_posts_per_profile: max_posts,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    // -- Validation --

    #[test]
    fn zero_profiles_is_rejected() {
        let err = request(0, 0, &[], 0, 0, 0).validate().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Invalid number of profiles");
    }

    #[test]
    fn partial_pictures_are_rejected() {
        let err = request(5, 3, &[("female", 3)], 0, 0, 0)
            .validate()
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("all profiles"));
    }

    #[test]
    fn distribution_must_sum_to_picture_count() {
        let err = request(5, 5, &[("female", 2), ("male", 2)], 0, 0, 0)
            .validate()
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("distribution"));
    }

    #[test]
    fn oversized_counts_are_rejected_without_overflow() {
        let err = request(
            1,
            1,
            &[("female", i64::MAX), ("male", i64::MAX), ("pets", 3)],
            0,
            0,
            0,
        )
        .validate()
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("distribution"));
    }

    #[test]
    fn single_count_above_picture_slots_is_rejected() {
        let err = request(2, 2, &[("female", 3), ("male", -1)], 0, 0, 0)
            .validate()
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("distribution"));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = request(1, 1, &[("dragons", 1)], 0, 0, 0)
            .validate()
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn posts_on_more_profiles_than_exist_is_rejected() {
        assert!(request(2, 0, &[], 3, 1, 1).validate().is_err());
    }

    #[test]
    fn min_above_max_is_rejected() {
        assert!(request(2, 0, &[], 2, 4, 3).validate().is_err());
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(request(2, 0, &[], -1, 0, 0).validate().is_err());
        assert!(request(1, 1, &[("male", -1), ("female", 2)], 0, 0, 0)
            .validate()
            .is_err());
    }

    #[test]
    fn distribution_is_ignored_without_pictures() {
        let validated = request(2, 0, &[("female", 9)], 0, 0, 0).validate().unwrap();
        assert!(validated.picture_type_distribution.is_empty());
    }

    #[test]
    fn zero_count_entries_are_dropped_and_order_kept() {
        let validated = request(3, 3, &[("pets", 1), ("male", 0), ("female", 2)], 0, 0, 0)
            .validate()
            .unwrap();
        let keys: Vec<_> = validated.picture_type_distribution.keys().copied().collect();
        assert_eq!(keys, vec![PictureCategory::Pets, PictureCategory::Female]);
    }

    // -- Allocation --

    #[test]
    fn allocation_matches_documented_example() {
        let validated = request(3, 3, &[("female", 2), ("male", 1)], 1, 2, 2)
            .validate()
            .unwrap();
        let specs = allocate(&validated, &mut rng());

        let summary: Vec<_> = specs
            .iter()
            .map(|s| (s.category, s.has_picture, s.post_count))
            .collect();
        assert_eq!(
            summary,
            vec![
                (PictureCategory::Female, true, 2),
                (PictureCategory::Female, true, 0),
                (PictureCategory::Male, true, 0),
            ]
        );
        // Three pictures plus the two posts of slot 0.
        assert_eq!(validated.max_images(), 5);
    }

    #[test]
    fn allocation_produces_every_slot_with_exact_distribution() {
        let validated = request(6, 6, &[("male", 1), ("pets", 3), ("female", 2)], 0, 0, 0)
            .validate()
            .unwrap();
        let specs = allocate(&validated, &mut rng());

        assert_eq!(specs.len(), 6);
        for (category, count) in &validated.picture_type_distribution {
            let allocated = specs.iter().filter(|s| s.category == *category).count();
            assert_eq!(allocated, *count as usize);
        }
        assert_eq!(specs[0].category, PictureCategory::Male);
        assert_eq!(specs[1].category, PictureCategory::Pets);
        assert_eq!(specs[5].category, PictureCategory::Female);
    }

    #[test]
    fn allocation_without_pictures_uses_random_category() {
        let validated = request(4, 0, &[], 2, 1, 3).validate().unwrap();
        let specs = allocate(&validated, &mut rng());

        assert_eq!(specs.len(), 4);
        assert!(specs.iter().all(|s| !s.has_picture));
        assert!(specs.iter().all(|s| s.category == PictureCategory::Random));
        assert!(specs[..2].iter().all(|s| (1..=3).contains(&s.post_count)));
        assert!(specs[2..].iter().all(|s| s.post_count == 0));
    }

    #[test]
    fn post_counts_stay_within_bounds_and_are_seed_deterministic() {
        let validated = request(50, 0, &[], 50, 2, 6).validate().unwrap();
        let first = allocate(&validated, &mut StdRng::seed_from_u64(42));
        let second = allocate(&validated, &mut StdRng::seed_from_u64(42));

        assert_eq!(first, second);
        assert!(first.iter().all(|s| (2..=6).contains(&s.post_count)));
    }

    #[test]
    fn request_deserializes_from_camel_case_with_legacy_alias() {
        let json = serde_json::json!({
            "numProfiles": 2,
            "profilesWithPics": 2,
            "picTypeDistribution": {"male": 1, "female": 1},
            "profilesWithPosts": 0,
            "minPostsPerProfile": 0,
            "maxPostsPerProfile": 0
        });
        let parsed: JobRequest = serde_json::from_value(json).unwrap();
        let keys: Vec<_> = parsed.picture_type_distribution.keys().cloned().collect();
        assert_eq!(keys, vec!["male".to_string(), "female".to_string()]);
    }
}
