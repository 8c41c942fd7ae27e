//! Apply stage: per-post transform and paced, conditional write-back.
//!
//! A bounded pool of workers drains a shared queue. The cap comes from
//! `RunConfig.concurrency` (one at a time); the only shared mutable state
//! is the context's guarded result lists, so the loop holds at any cap.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use postnote_shared::{PostRecord, Result};
use postnote_store::AdminClient;
use postnote_transform::{apply_endnote, classify};

use crate::context::{ApplyOutcome, MigrationContext, PostFailure};
use crate::pipeline::ProgressReporter;

/// Run the Apply stage over the discovered posts.
///
/// Every post is attempted exactly once; one post's failure never stops
/// its siblings. After the cancellation signal is raised, in-flight writes
/// complete but no further post starts.
#[instrument(skip_all, fields(posts = ctx.posts.len(), concurrency = ctx.config.concurrency))]
pub(crate) async fn apply(
    ctx: &MigrationContext,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> ApplyOutcome {
    let total = ctx.posts.len();
    if total == 0 {
        return ApplyOutcome::Completed;
    }

    let queue: Arc<Mutex<VecDeque<PostRecord>>> =
        Arc::new(Mutex::new(ctx.posts.iter().cloned().collect()));
    let (attempt_tx, mut attempt_rx) = mpsc::unbounded_channel::<String>();

    let mut handles = Vec::new();
    for worker in 0..ctx.config.concurrency {
        let queue = Arc::clone(&queue);
        let client = Arc::clone(&ctx.client);
        let updated = Arc::clone(&ctx.updated);
        let failures = Arc::clone(&ctx.failures);
        let block = ctx.endnote_block.clone();
        let delay = Duration::from_millis(ctx.config.delay_between_calls_ms);
        let cancel = cancel.clone();
        let attempt_tx = attempt_tx.clone();

        handles.push(tokio::spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    debug!(worker, "cancellation observed, not starting further posts");
                    break;
                }

                let Some(post) = queue.lock().await.pop_front() else {
                    break;
                };

                let label = post.label().to_string();
                match process_post(&client, &post, &block).await {
                    Ok(url) => {
                        updated.lock().await.push(url);
                        // Pacing between this worker's calls, not global.
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    Err(error) => {
                        warn!(post = %label, %error, "post update failed");
                        failures.lock().await.push(PostFailure {
                            title: label.clone(),
                            error,
                        });
                    }
                }

                let _ = attempt_tx.send(label);
            }
        }));
    }
    drop(attempt_tx);

    // Single collector for progress: the channel closes once every worker
    // has exited, which also bounds the attempted count.
    let mut attempted = 0usize;
    while let Some(label) = attempt_rx.recv().await {
        attempted += 1;
        progress.post_done(&label, attempted, total);
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "apply worker panicked");
        }
    }

    if cancel.is_cancelled() && attempted < total {
        ApplyOutcome::Cancelled
    } else {
        ApplyOutcome::Completed
    }
}

/// Transform one post and write it back under its concurrency stamp.
async fn process_post(client: &AdminClient, post: &PostRecord, block: &str) -> Result<String> {
    let source = classify(post);
    let updated = apply_endnote(&source, block)?;
    let edited = client.edit_post(&post.id, &post.updated_at, &updated).await?;
    Ok(edited.url.unwrap_or(edited.id))
}
