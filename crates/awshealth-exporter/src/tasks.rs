//! Background task supervision.

use tokio::task::JoinHandle;
use tracing::error;

/// Wait for a background task and log how it ended. Returns `false` when
/// the task panicked or was cancelled.
pub async fn join_logged(name: &'static str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) if e.is_panic() => {
            error!(task = name, error = %e, "background task panicked");
            false
        }
        Err(e) => {
            error!(task = name, error = %e, "background task was cancelled");
            false
        }
    }
}
