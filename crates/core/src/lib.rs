//! Domain logic for the persona generation service.
//!
//! Everything here is pure: validation, slot allocation, prompt selection,
//! progress math, expiry rules and storage naming. I/O lives in the `db`,
//! `imagegen` and `pipeline` crates.

pub mod allocation;
pub mod category;
pub mod error;
pub mod expiry;
pub mod naming;
pub mod progress;
pub mod prompts;
pub mod roles;
pub mod types;
