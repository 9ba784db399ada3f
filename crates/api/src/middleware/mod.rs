//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated caller, from the session cookie
//!   or a Bearer token.

pub mod auth;
