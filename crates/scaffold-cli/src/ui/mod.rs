//! UI components for the scaffold CLI.

pub mod progress;

pub use progress::ProgressSpinner;
