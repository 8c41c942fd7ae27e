//! Run-scoped state threaded through the pipeline stages.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use postnote_shared::{PostRecord, PostnoteError, RunConfig};
use postnote_store::AdminClient;

/// Mutable aggregate for one migration run.
///
/// Built at Initialize, filled by Discover, drained by Apply. The
/// `updated` and `failures` lists are append-only after creation and
/// guarded for concurrent appends from the apply workers.
pub struct MigrationContext {
    /// Per-run settings, immutable after construction.
    pub config: RunConfig,
    /// Rendered endnote block, immutable after construction.
    pub endnote_block: String,
    /// Store handle shared with the apply workers.
    pub client: Arc<AdminClient>,
    /// Posts resolved by the Discover stage.
    pub posts: Vec<PostRecord>,
    /// URLs (or ids) of successfully updated posts.
    pub updated: Arc<Mutex<Vec<String>>>,
    /// Per-post failures, tagged with the originating post's title.
    pub failures: Arc<Mutex<Vec<PostFailure>>>,
}

impl MigrationContext {
    /// Drain the accumulated results into a report.
    pub async fn into_report(self, outcome: ApplyOutcome, elapsed: Duration) -> MigrationReport {
        let updated = std::mem::take(&mut *self.updated.lock().await);
        let failures = std::mem::take(&mut *self.failures.lock().await);
        MigrationReport {
            updated,
            failures,
            outcome,
            elapsed,
        }
    }
}

/// One post that could not be updated.
#[derive(Debug)]
pub struct PostFailure {
    /// Title (or id, when the title is empty) of the offending post.
    pub title: String,
    pub error: PostnoteError,
}

impl std::fmt::Display for PostFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.error)
    }
}

/// How the Apply stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Every discovered post was attempted.
    Completed,
    /// Cancellation stopped the run before every post was attempted.
    /// In-flight writes were allowed to finish.
    Cancelled,
}

/// Final result of a migration run.
///
/// Run-level success or partial failure is derived by the caller from the
/// non-emptiness of `updated` vs `failures`.
#[derive(Debug)]
pub struct MigrationReport {
    /// URLs (or ids) of successfully updated posts.
    pub updated: Vec<String>,
    /// Per-post failures, in completion order.
    pub failures: Vec<PostFailure>,
    pub outcome: ApplyOutcome,
    pub elapsed: Duration,
}
