//! Pipeline orchestration for Postnote migrations.
//!
//! This crate ties the store client and the content transform into the
//! end-to-end migration run: Initialize → Discover → Apply, funneling
//! per-post results into one [`MigrationReport`].

mod apply;
pub mod context;
pub mod pipeline;

pub use context::{ApplyOutcome, MigrationContext, MigrationReport, PostFailure};
pub use pipeline::{ProgressReporter, SilentProgress, run_migration};
