//! Concrete strategy implementations plugged into the core pipeline

mod llm;
mod registry;

pub use llm::{LlmAnalyzer, LlmFixer, LlmGenerator};
pub use registry::{Provider, StrategyFactory, StrategyRegistry, StrategySet};
