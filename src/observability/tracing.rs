//! Run-scoped spans.

use tracing::Span;
use uuid::Uuid;

/// Root span for one rescue run, tagged with a fresh run id.
pub fn run_span() -> (Uuid, Span) {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("rescue", run_id = %run_id);
    (run_id, span)
}
