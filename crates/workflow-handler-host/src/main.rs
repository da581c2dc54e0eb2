// Entry point for the workflow handler host.
//
// Usage:
//   workflow-handler-host run [--descriptor-file <path>] [--timeout-secs <n>]
//   workflow-handler-host run-type <handler-type> [--config <raw>]
//   workflow-handler-host list
//
// The outcome JSON goes to stdout; diagnostics go to stderr. The exit status
// encodes the outcome (100 succeeded, 102 failed, 103 timed out).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use workflow_handler_host::{read_descriptor, render_outcome, run_descriptor};
use workflow_handlers::HandlerRegistry;
use workflow_sdk::{HandlerConfig, HandlerDescriptor, OutcomeCode};

/// Command-line arguments for the handler host.
#[derive(Parser, Debug)]
#[command(name = "workflow-handler-host", about = "Run a single workflow action handler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the handler described by a JSON descriptor (file or first stdin line).
    Run {
        /// Path to the descriptor; stdin is read when omitted.
        #[arg(long)]
        descriptor_file: Option<PathBuf>,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Run a handler by type with an inline configuration.
    RunType {
        handler_type: String,

        /// Raw configuration; JSON is parsed, anything else is plain text.
        #[arg(long, default_value = "")]
        config: String,

        #[command(flatten)]
        options: RunOptions,
    },

    /// List the registered handler types.
    List,
}

#[derive(Args, Debug)]
struct RunOptions {
    /// Fail the step as timed out after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the outcome on one line.
    #[arg(long)]
    compact: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let exit_code = match run(cli) {
        Ok(code) => code.to_return_code(),
        Err(e) => {
            tracing::error!("Handler host failed: {:#}", e);
            OutcomeCode::Failed.to_return_code()
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<OutcomeCode> {
    let registry = HandlerRegistry::with_builtin_handlers();

    let (descriptor, options) = match cli.command {
        Command::List => {
            for handler_type in registry.handler_types() {
                println!("{handler_type}");
            }
            return Ok(OutcomeCode::Succeeded);
        }
        Command::Run {
            descriptor_file,
            options,
        } => (read_descriptor(descriptor_file.as_deref())?, options),
        Command::RunType {
            handler_type,
            config,
            options,
        } => (
            HandlerDescriptor::new(handler_type, HandlerConfig::parse(&config)),
            options,
        ),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let timeout = options.timeout_secs.map(Duration::from_secs);
    let outcome = runtime
        .block_on(run_descriptor(&registry, &descriptor, timeout))
        .with_context(|| format!("Failed to create handler '{}'", descriptor.handler_type))?;

    println!("{}", render_outcome(&outcome, options.compact)?);
    Ok(outcome.code())
}
