//! OS signal handling.

use crate::lifecycle::Shutdown;

/// Exit status used when the operator forces termination.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Spawn a task that turns Ctrl-C into a cancellation request.
///
/// The first interrupt asks the rescue loop to stop at its next checkpoint;
/// a second one exits immediately.
pub fn spawn_ctrl_c_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::warn!("Interrupt received, stopping at the next checkpoint (Ctrl-C again to force)");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt, exiting now");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });
}
