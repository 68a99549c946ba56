//! Folio CLI - Markdown document indexer.
//!
//! Provides commands for:
//! - `index`: Index the source tree and list what was found
//! - `search`: Search indexed documents
//! - `show`: Print one document, whole or as chunks
//! - `watch`: Keep the index current while sources change

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{IndexArgs, SearchArgs, ShowArgs, WatchArgs};
use error::CliError;
use output::Output;

/// Folio - Markdown document indexer.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Enable verbose output (indexing and watch logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the source directory and list visible documents.
    Index(IndexArgs),
    /// Search documents by text or `tag:<name>`.
    Search(SearchArgs),
    /// Show a document by slug.
    Show(ShowArgs),
    /// Index, then re-index on every source change until interrupted.
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Index(args) => args.execute(),
        Commands::Search(args) => args.execute(),
        Commands::Show(args) => args.execute(),
        Commands::Watch(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
