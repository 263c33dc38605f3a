//! Core of the AI-assisted backend scaffolder.
//!
//! The pipeline is a bounded generate -> validate -> analyze -> fix retry
//! loop per artifact (schema, then API), expressed as a pure state machine
//! ([`machine::CodegenMachine`]) driven by an async orchestrator
//! ([`orchestrator::CodegenOrchestrator`]). A [`session::Session`] sequences
//! the two loops and persists the results.
//!
//! Everything external - model calls, type-checking, file writes - enters
//! through the injected traits in [`strategy`]. This crate performs no I/O
//! of its own.

pub mod artifact;
pub mod diagnostics;
pub mod machine;
pub mod orchestrator;
pub mod progress;
pub mod session;
pub mod state;
pub mod strategy;

// Re-export commonly used types
pub use artifact::{ArtifactKind, GeneratedArtifact, Specification, Trace};
pub use diagnostics::{ErrorInfo, Severity};
pub use machine::CodegenMachine;
pub use orchestrator::{AttemptOutcome, AttemptRecord, CodegenConfig, CodegenOrchestrator};
pub use progress::{ProgressEvent, ProgressReporter};
pub use session::{ScaffoldOutput, Session, SessionConfig, SessionFailure, Stage};
pub use state::{CodegenAction, CodegenEvent, CodegenFailure, CodegenState, FailureReason};
pub use strategy::{
    ActorError, ActorResult, AnalysisStrategy, FixPlan, FixStrategy, GenerationStrategy, Sink,
    Validator,
};
