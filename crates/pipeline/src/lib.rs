//! Job generation pipeline and expiry reaper.
//!
//! [`generation::GenerationPipeline`] turns one job request into profiles
//! and images, streaming progress through a [`events::ProgressSink`] and
//! committing everything (job, profiles, images, credit debit) at the end or
//! nothing at all. [`reaper::ExpiryReaper`] removes what has outlived its
//! retention window.

pub mod error;
pub mod events;
pub mod generation;
pub mod locks;
pub mod reaper;
pub mod storage;
pub mod store;

pub use error::PipelineError;
pub use events::{ProgressSink, StreamEvent};
pub use generation::{GenerationPipeline, PipelineSettings, PipelineState};
pub use locks::UserLocks;
pub use reaper::{ExpiryReaper, SweepReport};
pub use storage::{LocalImageStore, UndoLog};
pub use store::{ExpiryStore, JobOwner, JobStore, PgStore};
