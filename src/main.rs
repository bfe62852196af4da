//! peoplemem CLI entry point.

mod commands;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use peoplemem::{
    ChatCompletionsGenerator, Config, Error, MemoryEngine, OnnxEmbedder, PeopleMemory,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use commands::{Commands, Session};
use output::{print_json, ErrorResponse};

/// peoplemem - semantic memory of the people you know
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// User whose people are read or written
    #[arg(short, long, global = true, env = "PEOPLEMEM_USER")]
    user: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Version = cli.command {
        return commands::handle_version(cli.json).unwrap_or(ExitCode::FAILURE);
    }

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                print_json(&ErrorResponse {
                    error: e.to_string(),
                    kind: format!("{:?}", e.kind()),
                });
            } else {
                eprintln!("Error: {}", e);
            }
            commands::exit_code_for(&e)
        }
    }
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("peoplemem=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let user = cli
        .user
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| {
            Error::InvalidArgument("--user (or PEOPLEMEM_USER) is required".to_string())
        })?;

    let config = Config::load()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");
    config.ensure_directories()?;

    // Model download and session setup block; keep them off the async workers.
    let embedder = tokio::task::block_in_place(|| {
        OnnxEmbedder::new(&config.embedding_model, &config.model_cache)
    })?;
    let generator = ChatCompletionsGenerator::new(
        &config.llm_endpoint,
        &config.llm_model,
        config.llm_api_key.clone(),
    );
    let engine = Arc::new(MemoryEngine::from_config(
        &config,
        Arc::new(embedder),
        Arc::new(generator),
    )?);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let session = Session {
        people: PeopleMemory::new(Arc::clone(&engine), user),
        engine,
        cancel,
        json: cli.json,
    };
    commands::execute(&cli.command, &session).await
}
