//! Well-known role name constants.
//!
//! These must match the `role` column default in `0001_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
