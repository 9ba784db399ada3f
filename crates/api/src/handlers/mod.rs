pub mod auth;
pub mod generation;
pub mod jobs;
pub mod profiles;
