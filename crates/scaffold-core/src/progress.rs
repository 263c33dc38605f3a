//! Fire-and-forget progress notifications for observers.
//!
//! Observers subscribe through an unbounded channel; a slow or dropped
//! observer never blocks or fails the pipeline.

use tokio::sync::mpsc;

use crate::artifact::ArtifactKind;

/// Snapshot of where a codegen run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Which artifact is being worked on
    pub kind: ArtifactKind,

    /// Name of the state the run just entered
    pub state: &'static str,

    /// Current attempt number (0 before the first generation pass)
    pub attempt: u32,

    /// The configured retry bound
    pub max_attempts: u32,
}

/// Progress reporter handed to orchestrators.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressReporter {
    /// Create a reporter and the receiver an observer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report a progress event. Send errors are ignored on purpose: progress
    /// must never affect control flow.
    pub fn report(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}
