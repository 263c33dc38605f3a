//! Command line front end for the scaffold pipeline.
//!
//! Wires configuration, LLM-backed strategies, the external checker, and
//! filesystem persistence into a [`scaffold_core::Session`].

pub mod app;
pub mod check;
pub mod config;
pub mod llm;
pub mod sink;
pub mod strategies;
pub mod ui;

pub use app::{run, RunOptions, ScaffoldError};
