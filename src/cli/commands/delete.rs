//! Delete command: remove entities by filter or ids.

use anyhow::Result;
use clap::Args;

use super::common::{SelectionArgs, TargetArgs, confirm, connect, print_records};
use crate::cli::input::split_list;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{ItemOutput, VectorStore};

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub async fn handle_delete(args: DeleteArgs, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let store = VectorStore::new(
        connect(&config)?,
        args.target.database(&config),
        args.target.collection.as_str(),
    );

    if !args.yes
        && !confirm(&format!(
            "This will delete matching entities from '{}'. Continue?",
            args.target.collection
        ))?
    {
        println!("{}", formatter.format_message("Cancelled."));
        return Ok(());
    }

    let report = match (&args.selection.filter, &args.selection.ids) {
        (Some(filter), _) => store.delete_by_filter(filter).await?,
        (None, Some(ids)) => store.delete_by_ids(&split_list(ids)).await?,
        (None, None) => anyhow::bail!("either --filter or --ids is required"),
    };

    let outputs = vec![ItemOutput {
        item_index: 0,
        json: serde_json::to_value(report)?,
    }];
    print_records(format, &outputs);
    Ok(())
}
