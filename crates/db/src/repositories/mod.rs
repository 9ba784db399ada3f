//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod image_repo;
pub mod job_repo;
pub mod profile_repo;
pub mod user_repo;

pub use image_repo::ImageRepo;
pub use job_repo::{CommitError, JobRepo, PurgeCounts};
pub use profile_repo::ProfileRepo;
pub use user_repo::UserRepo;
