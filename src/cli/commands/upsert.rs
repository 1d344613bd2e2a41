//! Upsert command: insert or replace records by primary key.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use super::common::{TargetArgs, connect, print_records};
use crate::cli::input::read_input;
use crate::models::{Config, OutputFormat};
use crate::services::{ItemOutput, VectorStore};

#[derive(Debug, Args)]
pub struct UpsertArgs {
    /// Path to a JSON file holding an array of records (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,
}

pub async fn handle_upsert(args: UpsertArgs, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let input = read_input(args.file.as_deref())?;
    let data: Value = serde_json::from_str(input.trim()).context("failed to parse update data")?;

    let store = VectorStore::new(
        connect(&config)?,
        args.target.database(&config),
        args.target.collection.as_str(),
    );
    let report = store.upsert(&data).await?;

    let outputs = vec![ItemOutput {
        item_index: 0,
        json: serde_json::to_value(report)?,
    }];
    print_records(format, &outputs);
    Ok(())
}
