//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO built by the generation pipeline for the final commit

pub mod job;
pub mod profile;
pub mod user;
