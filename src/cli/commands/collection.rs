use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::common::{confirm, connect};
use crate::cli::output::get_formatter;
use crate::models::{
    CollectionSpec, Config, IndexType, MetricType, OutputFormat, validate_collection_name,
};

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    #[command(about = "List collections")]
    List {
        #[arg(long, short = 'd', help = "Database name")]
        database: Option<String>,
    },
    #[command(about = "Create a collection with id, vector and text fields")]
    Create(CreateCollectionArgs),
    #[command(about = "Show a collection's schema and indexes")]
    Describe {
        name: String,
        #[arg(long, short = 'd', help = "Database name")]
        database: Option<String>,
    },
    #[command(about = "Drop a collection and all of its data")]
    Drop {
        name: String,
        #[arg(long, short = 'd', help = "Database name")]
        database: Option<String>,
        #[arg(long, short = 'y', help = "Skip confirmation prompt")]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct CreateCollectionArgs {
    pub name: String,

    #[arg(long, short = 'd', help = "Database name")]
    pub database: Option<String>,

    #[arg(long, help = "Vector dimension")]
    pub dimension: Option<u32>,

    #[arg(long, help = "Similarity metric: COSINE, L2, or IP")]
    pub metric: Option<MetricType>,

    #[arg(long, help = "Index type: AUTOINDEX, IVF_FLAT, or HNSW")]
    pub index: Option<IndexType>,
}

pub async fn handle_collection(cmd: CollectionCommand, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let client = connect(&config)?;
    let database_or_default =
        |database: &Option<String>| database.clone().unwrap_or_else(|| config.connection.database.clone());

    match cmd {
        CollectionCommand::List { database } => {
            let database = database_or_default(&database);
            let names = client
                .list_collections(&database)
                .await
                .context("failed to list collections")?;
            print!("{}", formatter.format_collections(&names));
        }
        CollectionCommand::Create(args) => {
            validate_collection_name(&args.name)?;
            let database = database_or_default(&args.database);
            let spec = CollectionSpec {
                dimension: args.dimension.unwrap_or(config.collection.dimension),
                metric_type: args.metric.unwrap_or(config.collection.metric_type),
                index_type: args.index.unwrap_or(config.collection.index_type),
            };
            if spec.dimension == 0 {
                anyhow::bail!("dimension must be at least 1");
            }

            client
                .create_collection(&database, &args.name, &spec)
                .await
                .with_context(|| format!("failed to create collection '{}'", args.name))?;
            println!(
                "{}",
                formatter.format_message(&format!(
                    "Created collection '{}' ({} dims, {}, {})",
                    args.name, spec.dimension, spec.metric_type, spec.index_type
                ))
            );
        }
        CollectionCommand::Describe { name, database } => {
            let database = database_or_default(&database);
            let info = client
                .describe_collection(&database, &name)
                .await
                .with_context(|| format!("failed to describe collection '{}'", name))?;
            print!("{}", formatter.format_value(&format!("Collection {}", name), &info));
        }
        CollectionCommand::Drop {
            name,
            database,
            yes,
        } => {
            let database = database_or_default(&database);
            if !yes
                && !confirm(&format!(
                    "This will drop collection '{}' in database '{}'. Continue?",
                    name, database
                ))?
            {
                println!("{}", formatter.format_message("Cancelled."));
                return Ok(());
            }

            client
                .drop_collection(&database, &name)
                .await
                .with_context(|| format!("failed to drop collection '{}'", name))?;
            println!(
                "{}",
                formatter.format_message(&format!("Dropped collection '{}'", name))
            );
        }
    }

    Ok(())
}
