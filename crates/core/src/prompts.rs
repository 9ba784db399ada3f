//! Fixed prompt catalogs for profile pictures and posts.
//!
//! Selection is uniform over the catalog for the category. The random source
//! is injected so callers (and tests) control determinism.

use rand::Rng;

use crate::category::PictureCategory;

const FEMALE_PICTURE_PROMPTS: &[&str] = &[
    "low quality grainy picture of a woman from far away in 2009.jpg",
    "close_up_woman_low_quality_selfie_casual_top_angle.jpg",
    "close_up_woman_low_quality_selfie_casual_bottom_angle.jpg",
    "close_up_woman_low_quality_selfie_casual_side_angle.jpg",
    "solo_low_quality_selfie_casual_car.jpg",
    "solo_low_quality_selfie_casual_beach_woman.jpg",
    "low quality grainy picture of a woman taken at a park in 2004 from different angles",
    "low quality grainy picture of a  woman taken at a beach in 2004.jpg",
    "low quality grainy picture of a woman taken at a hike in 2004.jpg",
    "low quality grainy picture of a woman taken at a ballroom in 2004.jpg",
    "low quality grainy picture of a young woman taken at a library in 2004.jpg",
    "low quality grainy picture of a woman taken at a library in 2004.jpg",
    "low quality grainy picture of a woman taken at a library in 2004.jpg",
    "low quality grainy picture of a woman taken at a party in 2004.jpg",
    "close_up_woman_low_quality_selfie_casual.jpg",
    "close_up_woman_low_quality_selfie.jpg",
    "akward_close_up_woman_low_quality_selfie.jpg",
    "photo_of_instagram_woman_casual_far.heic",
    "photo_of_instagram_woman_casual.heic",
    "photo_of_instagram_woman_casual_selfie.heic",
    "photo_of_instagram_woman_casual_far_glasses.heic",
    "photo_of_instagram_woman_casual_far_street_photography.heic",
    "photo_of_instagram_woman_casual_far_street_photography_black_and_white.heic",
];

const MALE_PICTURE_PROMPTS: &[&str] = &[
    "low quality grainy picture of a man from far away in 2009.jpg",
    "close_up_man_low_quality_selfie_casual_top_angle.jpg",
    "close_up_man_low_quality_selfie_casual_bottom_angle.jpg",
    "close_up_man_low_quality_selfie_casual_side_angle.jpg",
    "solo_low_quality_selfie_casual_car.jpg",
    "solo_low_quality_selfie_casual_beach_man.jpg",
    "low quality grainy picture of a man taken at a park in 2004 from different angles",
    "low quality grainy picture of a  man taken at a beach in 2004.jpg",
    "low quality grainy picture of a man taken at a hike in 2004.jpg",
    "low quality grainy picture of a man taken at a ballroom in 2004.jpg",
    "low quality grainy picture of a young man taken at a library in 2004.jpg",
    "low quality grainy picture of a man taken at a library in 2004.jpg",
    "low quality grainy picture of a man taken at a library in 2004.jpg",
    "low quality grainy picture of a man taken at a party in 2004.jpg",
    "close_up_man_low_quality_selfie_casual.jpg",
    "close_up_man_low_quality_selfie.jpg",
    "akward_close_up_man_low_quality_selfie.jpg",
    "photo_of_instagram_man_casual_far.heic",
    "photo_of_instagram_man_casual.heic",
    "photo_of_instagram_man_casual_selfie.heic",
    "photo_of_instagram_man_casual_far_glasses.heic",
    "photo_of_instagram_man_casual_far_street_photography.heic",
    "photo_of_instagram_man_casual_far_street_photography_black_and_white.heic",
];

const PET_PICTURE_PROMPTS: &[&str] = &[
    "pet_instagram_selfie_low_quality.jpg",
    "pet_instagram_selfie.jpg",
    "dog_instagram_selfie_low_quality.jpg",
    "cat_instagram_selfie_low_quality.jpg",
    "dog_instagram_selfie.jpg",
    "cat_instagram_selfie.jpg",
];

const RANDOM_PICTURE_PROMPTS: &[&str] = &["random_instagram.jpg"];

/// Scenes shared by every post catalog.
const COMMON_POST_PROMPTS: &[&str] = &[
    "instagram.heic",
    "instagram_food.heic",
    "instagram_nature.heic",
    "instagram_travel.heic",
    "instagram_inside_plane_travel.heic",
    "instagram_beach.heic",
    "instagram_mountains.heic",
    "instagram_street_photography.heic",
];

const MAN_POST_PROMPTS: &[&str] = &[
    "instagram_man_friends.heic",
    "instagram_man_food.heic",
    "instagram_man_nature_no_face.heic",
    "instagram_man_facing_away.heic",
    "instagram_man_city_facing_away.jpg",
    "instagram_man_pet.heic",
    "instagram_man_dog.heic",
];

const WOMAN_POST_PROMPTS: &[&str] = &[
    "instagram_woman_friends.heic",
    "instagram_woman_food.heic",
    "instagram_women_nature_no_face.heic",
    "instagram_women_facing_away.heic",
    "instagram_women_city_facing_away.jpg",
    "instagram_woman_pet.heic",
    "instagram_woman_dog.heic",
];

const ANIMAL_POST_PROMPTS: &[&str] = &[
    "instagram_dog.heic",
    "instagram_dog.jpg",
    "instagram_cat.jpg",
    "instagram_cat.heic",
];

const NOSTALGIA_POST_PROMPTS: &[&str] = &[
    "low quality grainy picture of a party taken at a library in 2004.jpg",
    "low quality grainy picture of a party taken at a park in 2004.jpg",
    "low quality grainy picture of a party taken in a ballroom in 2009.jpg",
    "low quality grainy picture of travelling in 2009.jpg",
    "low quality grainy picture of a big city in 2009.jpg",
    "low quality grainy picture of a party taken in a big city in 2009.jpg",
    "low quality grainy picture of a party taken in a bar in 2009.jpg",
    "low quality grainy picture of a group of friends having dinner in 2009.jpg",
];

/// Pick a profile-picture prompt for `category`.
pub fn choose_picture_prompt<R: Rng + ?Sized>(
    category: PictureCategory,
    rng: &mut R,
) -> &'static str {
    let catalog = match category {
        PictureCategory::Female => FEMALE_PICTURE_PROMPTS,
        PictureCategory::Male => MALE_PICTURE_PROMPTS,
        PictureCategory::Pets => PET_PICTURE_PROMPTS,
        PictureCategory::Random => RANDOM_PICTURE_PROMPTS,
    };
    catalog[rng.random_range(0..catalog.len())]
}

/// Pick a post prompt. `None` (pictures skipped for the whole job) draws from
/// the `random` post catalog.
pub fn choose_post_prompt<R: Rng + ?Sized>(
    category: Option<PictureCategory>,
    rng: &mut R,
) -> &'static str {
    let groups = post_catalog(category.unwrap_or(PictureCategory::Random));
    let total: usize = groups.iter().map(|g| g.len()).sum();
    let mut index = rng.random_range(0..total);
    for group in groups {
        if index < group.len() {
            return group[index];
        }
        index -= group.len();
    }
    unreachable!("index is drawn below the catalog length")
}

/// Pick a prompt for either kind of image.
pub fn choose<R: Rng + ?Sized>(
    category: PictureCategory,
    is_post: bool,
    rng: &mut R,
) -> &'static str {
    if is_post {
        choose_post_prompt(Some(category), rng)
    } else {
        choose_picture_prompt(category, rng)
    }
}

/// Post catalog for a category, as the ordered concatenation of its groups.
fn post_catalog(category: PictureCategory) -> &'static [&'static [&'static str]] {
    match category {
        PictureCategory::Female => &[
            COMMON_POST_PROMPTS,
            WOMAN_POST_PROMPTS,
            ANIMAL_POST_PROMPTS,
            NOSTALGIA_POST_PROMPTS,
        ],
        PictureCategory::Male => &[
            COMMON_POST_PROMPTS,
            MAN_POST_PROMPTS,
            ANIMAL_POST_PROMPTS,
            NOSTALGIA_POST_PROMPTS,
        ],
        PictureCategory::Pets | PictureCategory::Random => &[
            COMMON_POST_PROMPTS,
            MAN_POST_PROMPTS,
            WOMAN_POST_PROMPTS,
            ANIMAL_POST_PROMPTS,
            NOSTALGIA_POST_PROMPTS,
        ],
    }
}
