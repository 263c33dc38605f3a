//! CLI entry point wiring: config, strategies, session, and output.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use console::style;
use scaffold_core::{
    AttemptOutcome, AttemptRecord, ProgressReporter, ScaffoldOutput, Session, SessionConfig,
    SessionFailure, Sink, Trace,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::check::CommandValidator;
use crate::config::{ConfigError, Settings};
use crate::sink::{FsSink, NoopSink};
use crate::strategies::StrategyRegistry;
use crate::ui::ProgressSpinner;

const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    #[error("unknown provider '{name}' (available: {available})")]
    UnknownProvider { name: String, available: String },

    #[error(transparent)]
    Session(#[from] SessionFailure),
}

/// Options collected from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub description: String,
    pub out_dir: PathBuf,
    pub max_attempts: Option<u32>,
    pub provider: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
    pub trace: Option<String>,
}

/// Run a full scaffold session from CLI options.
pub async fn run(options: RunOptions) -> Result<(), ScaffoldError> {
    let mut settings = Settings::load()?;
    if let Some(max_attempts) = options.max_attempts {
        settings.retry.max_attempts = max_attempts;
    }
    if let Some(provider) = &options.provider {
        settings.model.provider = provider.clone();
    }

    let api_key = std::env::var(API_KEY_VAR).map_err(|_| ScaffoldError::MissingApiKey)?;

    let registry = StrategyRegistry::with_defaults();
    let strategies = registry
        .build(&settings.model.provider, &settings.model, &api_key)
        .ok_or_else(|| ScaffoldError::UnknownProvider {
            name: settings.model.provider.clone(),
            available: registry.providers().join(", "),
        })?;

    let validator = Arc::new(CommandValidator::from_settings(
        &settings.checker,
        &settings.output.schema_file,
        &settings.output.api_file,
    ));
    let sink: Arc<dyn Sink> = if options.dry_run {
        Arc::new(NoopSink)
    } else {
        Arc::new(FsSink)
    };

    let config = SessionConfig {
        max_attempts: settings.retry.max_attempts,
        verbose: options.verbose,
        schema_path: options.out_dir.join(&settings.output.schema_file),
        api_path: options.out_dir.join(&settings.output.api_file),
    };

    let trace = Trace::new(options.trace.clone().unwrap_or_else(generate_trace_id));
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n[CANCEL] interrupt received, stopping");
            signal_token.cancel();
        }
    });

    let mut session = Session::new(
        config,
        strategies.generator,
        strategies.analyzer,
        strategies.fixer,
        validator,
        sink,
    );

    // The spinner ends when the session (and with it the reporter) drops.
    let mut spinner_task = None;
    if !options.verbose {
        let (reporter, rx) = ProgressReporter::channel();
        session = session.with_progress(reporter);
        spinner_task = Some(tokio::spawn(ProgressSpinner::new().follow(rx)));
    }

    let result = session.run(options.description.as_str(), &trace, &cancel).await;
    drop(session);
    if let Some(task) = spinner_task {
        let _ = task.await;
    }

    let output = result?;
    print_summary(&output, &options);
    Ok(())
}

fn generate_trace_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("scaffold-{}", millis)
}

fn print_summary(output: &ScaffoldOutput, options: &RunOptions) {
    println!("{}", style("Scaffold complete").green().bold());
    print_stage_summary("schema", &output.schema_attempts);
    print_stage_summary("api", &output.api_attempts);

    if options.dry_run {
        println!("  {} nothing was written", style("(dry run)").dim());
    } else {
        println!("  wrote {}", style(options.out_dir.display()).cyan());
    }
}

fn print_stage_summary(stage: &str, attempts: &[AttemptRecord]) {
    let passed = attempts
        .iter()
        .any(|a| matches!(a.outcome, AttemptOutcome::Passed));
    let status = if passed {
        style("ok").green()
    } else {
        style("failed").red()
    };
    println!(
        "  {}: {} after {} attempt{}",
        stage,
        status,
        attempts.len(),
        if attempts.len() == 1 { "" } else { "s" }
    );
    for record in attempts {
        if !record.errors.is_empty() {
            println!(
                "    attempt {}: {} error{}",
                record.attempt_number,
                record.errors.len(),
                if record.errors.len() == 1 { "" } else { "s" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_is_prefixed() {
        assert!(generate_trace_id().starts_with("scaffold-"));
    }
}
