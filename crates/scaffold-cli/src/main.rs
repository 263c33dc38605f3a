use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use scaffold_cli::{run, RunOptions};

/// AI-assisted backend scaffolding
#[derive(Parser, Debug)]
#[command(name = "scaffold")]
#[command(version, about, long_about = None)]
struct Args {
    /// Plain-language description of the backend to scaffold
    description: String,

    /// Directory the generated files are written to
    #[arg(short, long, default_value = "generated")]
    out_dir: PathBuf,

    /// Maximum validation attempts per artifact
    #[arg(long)]
    max_attempts: Option<u32>,

    /// LLM provider to use
    #[arg(long)]
    provider: Option<String>,

    /// Run the pipeline without writing any files
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose state transition logging
    #[arg(short, long)]
    verbose: bool,

    /// Trace id threaded through all pipeline logs
    #[arg(long)]
    trace: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let options = RunOptions {
        description: args.description,
        out_dir: args.out_dir,
        max_attempts: args.max_attempts,
        provider: args.provider,
        dry_run: args.dry_run,
        verbose: args.verbose,
        trace: args.trace,
    };

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
