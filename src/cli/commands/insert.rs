//! Insert command: one record per input item.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::{TargetArgs, connect, print_records};
use crate::cli::input::{parse_items, read_input, split_list};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{InsertOptions, VectorStore, run_items};

#[derive(Debug, Args)]
pub struct InsertArgs {
    /// Path to a JSON or JSONL file (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Field holding the text to store
    #[arg(long, default_value = "text")]
    pub text_field: String,

    /// Field holding the vector
    #[arg(long, default_value = "vector")]
    pub vector_field: String,

    /// Fields copied right after the text (comma-separated)
    #[arg(long)]
    pub metadata_fields: Option<String>,

    /// Delete every entity in the collection before inserting
    #[arg(long)]
    pub clear: bool,
}

pub async fn handle_insert(args: InsertArgs, format: OutputFormat, continue_on_fail: bool) -> Result<()> {
    let config = Config::load()?;
    let store = VectorStore::new(
        connect(&config)?,
        args.target.database(&config),
        args.target.collection.as_str(),
    );
    let options = InsertOptions {
        text_field: args.text_field.clone(),
        vector_field: args.vector_field.clone(),
        metadata_fields: args.metadata_fields.as_deref().map(split_list).unwrap_or_default(),
    };

    let input = read_input(args.file.as_deref())?;
    let items = parse_items(&input)?;
    if items.is_empty() {
        println!("{}", get_formatter(format).format_message("No records found in input."));
        return Ok(());
    }

    if args.clear {
        store.clear_collection().await;
    }

    let store = &store;
    let items = &items;
    let options = &options;
    let outputs = run_items(items.len(), continue_on_fail, |item_index| async move {
        let report = store.insert_record(&items[item_index], item_index, options).await?;
        Ok::<_, anyhow::Error>(vec![serde_json::to_value(report)?])
    })
    .await?;

    print_records(format, &outputs);
    Ok(())
}
