//! Query command: fetch entities by filter or ids.

use anyhow::Result;
use clap::Args;

use super::common::{SelectionArgs, TargetArgs, connect, print_records};
use crate::cli::input::split_list;
use crate::models::{Config, OutputFormat};
use crate::services::{ItemOutput, VectorStore, parse_output_fields};

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Maximum number of entities for filter queries
    #[arg(long, short = 'n')]
    pub limit: Option<u32>,

    /// Comma-separated output fields, or * for all
    #[arg(long, default_value = "*")]
    pub output_fields: String,
}

pub async fn handle_query(args: QueryArgs, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let store = VectorStore::new(
        connect(&config)?,
        args.target.database(&config),
        args.target.collection.as_str(),
    );
    let output_fields = parse_output_fields(&args.output_fields);

    let rows = match (&args.selection.filter, &args.selection.ids) {
        (Some(filter), _) => {
            let limit = args.limit.unwrap_or(config.search.query_limit);
            store.query_by_filter(filter, limit, output_fields).await?
        }
        (None, Some(ids)) => store.query_by_ids(&split_list(ids), output_fields).await?,
        (None, None) => anyhow::bail!("either --filter or --ids is required"),
    };

    tracing::debug!(rows = rows.len(), "query returned");

    let outputs: Vec<ItemOutput> = rows
        .into_iter()
        .map(|json| ItemOutput { item_index: 0, json })
        .collect();
    print_records(format, &outputs);
    Ok(())
}
