//! Spinner that follows pipeline progress events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use scaffold_core::ProgressEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// Spinner bound to the pipeline progress channel.
pub struct ProgressSpinner {
    bar: ProgressBar,
}

impl ProgressSpinner {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.yellow} {msg}")
                .unwrap(),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Drain progress events until the pipeline drops its reporter,
    /// updating the spinner message as states change.
    pub async fn follow(self, mut rx: UnboundedReceiver<ProgressEvent>) {
        while let Some(event) = rx.recv().await {
            self.bar.set_message(format_event(&event));
        }
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressSpinner {
    fn default() -> Self {
        Self::new()
    }
}

fn format_event(event: &ProgressEvent) -> String {
    if event.attempt == 0 {
        format!("{}: {}", event.kind, event.state)
    } else {
        format!(
            "{}: {} (attempt {}/{})",
            event.kind, event.state, event.attempt, event.max_attempts
        )
    }
}
