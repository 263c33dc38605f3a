//! CLI configuration loading and defaults

mod settings;

pub use settings::{CheckerSettings, ConfigError, ModelSettings, OutputSettings, RetrySettings, Settings};
