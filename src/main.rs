use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use zrag::cli::commands::{
    handle_chunk, handle_collection, handle_config, handle_delete, handle_insert, handle_kb,
    handle_load, handle_query, handle_retrieve, handle_upsert,
};
use zrag::cli::output::get_formatter;
use zrag::cli::{Cli, Commands};
use zrag::models::{Config, OutputFormat};

/// Log to stderr so stdout stays parseable. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "zrag=debug" } else { "zrag=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let default_format = Config::load()
        .map(|c| c.search.default_format)
        .unwrap_or_default();
    let format = cli.format.unwrap_or(default_format);

    tokio::select! {
        result = run_command(cli.command, format, cli.continue_on_fail) => {
            if let Err(e) = result {
                let message = format!("{:#}", e);
                eprintln!("{}", get_formatter(format).format_error(&message).trim_end());
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            tracing::warn!("received shutdown signal");
            eprintln!("\nInterrupted.");
        }
    }

    Ok(())
}

async fn run_command(command: Commands, format: OutputFormat, continue_on_fail: bool) -> Result<()> {
    match command {
        Commands::Chunk(args) => handle_chunk(args, format, continue_on_fail).await,
        Commands::Kb(cmd) => handle_kb(cmd, format, continue_on_fail).await,
        Commands::Collection(cmd) => handle_collection(cmd, format).await,
        Commands::Insert(args) => handle_insert(args, format, continue_on_fail).await,
        Commands::Load(args) => handle_load(args, format, continue_on_fail).await,
        Commands::Retrieve(args) => handle_retrieve(args, format, continue_on_fail).await,
        Commands::Query(args) => handle_query(args, format).await,
        Commands::Delete(args) => handle_delete(args, format).await,
        Commands::Upsert(args) => handle_upsert(args, format).await,
        Commands::Config(cmd) => handle_config(cmd, format).await,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
