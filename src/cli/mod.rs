//! CLI module for zrag.

pub mod commands;
pub mod input;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Chunk documents and manage knowledge bases in a Milvus/Zilliz vector database.
#[derive(Debug, Parser)]
#[command(name = "zrag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        help = "Emit an error record for a failing item and keep going"
    )]
    pub continue_on_fail: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split documents into chunk records (no database access)
    Chunk(commands::ChunkArgs),

    /// Knowledge base operations (ingest, search, context, create)
    #[command(subcommand)]
    Kb(commands::KbCommand),

    /// Manage collections
    #[command(subcommand)]
    Collection(commands::CollectionCommand),

    /// Insert one record per input item
    Insert(commands::InsertArgs),

    /// Similarity search returning one record per hit
    Load(commands::LoadArgs),

    /// Similarity search without threshold or result decoration
    Retrieve(commands::RetrieveArgs),

    /// Fetch entities by filter expression or ids
    Query(commands::QueryArgs),

    /// Delete entities by filter expression or ids
    Delete(commands::DeleteArgs),

    /// Insert or replace records by primary key
    Upsert(commands::UpsertArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "zrag",
            "delete",
            "--collection",
            "docs",
            "--ids",
            "1,2",
            "--format",
            "json",
            "--continue-on-fail",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.continue_on_fail);
        assert!(matches!(cli.command, Commands::Delete(_)));
    }

    #[test]
    fn test_cli_kb_search() {
        let cli = Cli::try_parse_from([
            "zrag",
            "kb",
            "search",
            "-c",
            "docs",
            "--vector",
            "[0.1, 0.2]",
            "--max-results",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Kb(commands::KbCommand::Search(args)) => {
                assert_eq!(args.search.max_results, Some(3));
                assert_eq!(args.search.vector.as_deref(), Some("[0.1, 0.2]"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_retrieve_defaults() {
        let cli = Cli::try_parse_from(["zrag", "retrieve", "-c", "docs", "--vector", "[1.0]"])
            .unwrap();

        match cli.command {
            Commands::Retrieve(args) => {
                assert_eq!(args.limit, 50);
                assert!(!args.include_vectors);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_filter_and_ids_together() {
        let result = Cli::try_parse_from([
            "zrag", "query", "-c", "docs", "--filter", "id > 1", "--ids", "1",
        ]);
        assert!(result.is_err());
    }
}
