//! Row progress for bulk runs. The runner emits done/total after each row;
//! the console layer consumes it through a sink.

use std::sync::Arc;

/// One progress update: rows finished so far and the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Sink for progress events. Implementations may throttle.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
