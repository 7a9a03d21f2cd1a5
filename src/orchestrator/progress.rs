// src/orchestrator/progress.rs
// Progress events pushed to the caller while an attempt runs

use serde::Serialize;

/// Pipeline phase labels, in the order a successful attempt visits them.
/// `uploading`/`processing` only appear on the staged path, `refining` only
/// when refinement is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preparing,
    Uploading,
    Processing,
    Transcribing,
    Refining,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub percentage: u8,
}

impl ProgressEvent {
    pub fn new(phase: Phase, percentage: u8) -> Self {
        Self {
            phase,
            percentage: percentage.min(100),
        }
    }
}

/// Sink for progress events. Invoked synchronously in emission order; the
/// orchestrator never awaits it, so implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}
