//! End-to-end migration pipeline: Initialize → Discover → Apply.
//!
//! The stages run as sequential fallible functions over a
//! [`MigrationContext`]. Initialize and Discover failures are fatal and
//! abort the run before any post is touched; per-post failures during
//! Apply are collected in the context and never abort the batch.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use postnote_shared::{Result, RunConfig, normalize_api_url};
use postnote_store::AdminClient;
use postnote_transform::endnote_block;

use crate::apply;
use crate::context::{MigrationContext, MigrationReport};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called after each post attempt (success or failure).
    fn post_done(&self, title: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &MigrationReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn post_done(&self, _title: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &MigrationReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full migration.
///
/// 1. Initialize: validate inputs, normalize the endpoint, render the
///    endnote block, open the store handle
/// 2. Discover: resolve the target posts by id
/// 3. Apply: transform and write back each post under a concurrency cap
///    and inter-call pacing
#[instrument(skip_all, fields(api_url = %config.api_url, posts = config.post_ids.len()))]
pub async fn run_migration(
    config: RunConfig,
    progress: &dyn ProgressReporter,
    cancel: CancellationToken,
) -> Result<MigrationReport> {
    let start = Instant::now();

    progress.phase("Initialising API connection");
    let mut ctx = initialize(config)?;

    progress.phase("Fetching posts by id");
    discover(&mut ctx).await?;

    progress.phase("Adding endnote block to posts");
    let outcome = apply::apply(&ctx, progress, &cancel).await;

    let report = ctx.into_report(outcome, start.elapsed()).await;

    info!(
        updated = report.updated.len(),
        failures = report.failures.len(),
        outcome = ?report.outcome,
        elapsed_ms = report.elapsed.as_millis(),
        "migration complete"
    );
    progress.done(&report);

    Ok(report)
}

/// Validate the run inputs, normalize the endpoint, and open the store
/// handle. Failure here is fatal; no post has been touched.
fn initialize(config: RunConfig) -> Result<MigrationContext> {
    config.validate()?;

    let api_url = normalize_api_url(&config.api_url, config.rewrite_localhost)?;
    let block = endnote_block(&config.content);
    let client = AdminClient::new(&api_url, &config.admin_key, config.page_size)?;

    info!(endpoint = %api_url, "initialised API connection");

    Ok(MigrationContext {
        config,
        endnote_block: block,
        client: Arc::new(client),
        posts: Vec::new(),
        updated: Arc::new(Mutex::new(Vec::new())),
        failures: Arc::new(Mutex::new(Vec::new())),
    })
}

/// Resolve the target posts. Zero results is a valid outcome that makes
/// Apply a no-op; a transport failure aborts the run.
async fn discover(ctx: &mut MigrationContext) -> Result<()> {
    ctx.posts = ctx.client.browse_by_ids(&ctx.config.post_ids).await?;
    info!(found = ctx.posts.len(), "post discovery complete");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
