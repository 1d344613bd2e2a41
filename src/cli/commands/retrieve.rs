//! Retrieve command: plain similarity search, one record per hit.

use anyhow::{Context, Result};
use clap::Args;

use super::common::{TargetArgs, connect, print_records};
use crate::models::{Config, OutputFormat, parse_query_vector};
use crate::services::{RetrieveOptions, VectorStore, run_items};

#[derive(Debug, Args)]
pub struct RetrieveArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Query vector as a JSON array, e.g. '[0.1, 0.2]'
    #[arg(long)]
    pub vector: String,

    /// Maximum number of hits
    #[arg(long, short = 'n', default_value_t = 50)]
    pub limit: u32,

    /// Filter expression
    #[arg(long)]
    pub filter: Option<String>,

    /// Include vector values in the hits
    #[arg(long)]
    pub include_vectors: bool,
}

pub async fn handle_retrieve(
    args: RetrieveArgs,
    format: OutputFormat,
    continue_on_fail: bool,
) -> Result<()> {
    let config = Config::load()?;
    let vector = parse_query_vector(&args.vector).context("invalid --vector")?;
    if args.limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    let store = VectorStore::new(
        connect(&config)?,
        args.target.database(&config),
        args.target.collection.as_str(),
    );
    let options = RetrieveOptions {
        limit: args.limit,
        filter: args.filter.clone(),
        include_vectors: args.include_vectors,
    };

    let store = &store;
    let options = &options;
    let vector = &vector;
    let outputs = run_items(1, continue_on_fail, |_| async move {
        let records = store.retrieve(vector.clone(), options).await?;
        Ok::<_, anyhow::Error>(records.into_iter().map(serde_json::Value::Object).collect())
    })
    .await?;

    print_records(format, &outputs);
    Ok(())
}
