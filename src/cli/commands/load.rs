//! Load command: similarity search with one output record per hit.

use anyhow::{Context, Result};
use clap::Args;

use super::common::{TargetArgs, connect, print_records};
use crate::models::{Config, OutputFormat, parse_query_vector};
use crate::services::{LoadOptions, VectorStore, parse_output_fields, run_items};

#[derive(Debug, Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Query vector as a JSON array, e.g. '[0.1, 0.2]'
    #[arg(long)]
    pub vector: String,

    /// Number of hits to request
    #[arg(long, short = 'k')]
    pub top_k: Option<u32>,

    /// Filter expression
    #[arg(long)]
    pub filter: Option<String>,

    /// Comma-separated output fields, or * for all
    #[arg(long, default_value = "*")]
    pub output_fields: String,

    /// Drop hits scoring below this
    #[arg(long)]
    pub score_threshold: Option<f32>,
}

pub async fn handle_load(args: LoadArgs, format: OutputFormat, continue_on_fail: bool) -> Result<()> {
    let config = Config::load()?;
    let vector = parse_query_vector(&args.vector).context("invalid --vector")?;
    let top_k = args.top_k.unwrap_or(config.search.top_k);
    if top_k == 0 {
        anyhow::bail!("top-k must be at least 1");
    }

    let store = VectorStore::new(
        connect(&config)?,
        args.target.database(&config),
        args.target.collection.as_str(),
    );
    let options = LoadOptions {
        top_k,
        filter: args.filter.clone(),
        output_fields: parse_output_fields(&args.output_fields),
        score_threshold: args.score_threshold,
    };

    let store = &store;
    let options = &options;
    let vector = &vector;
    let outputs = run_items(1, continue_on_fail, |_| async move {
        let records = store.load(vector.clone(), options).await?;
        Ok::<_, anyhow::Error>(records.into_iter().map(serde_json::Value::Object).collect())
    })
    .await?;

    print_records(format, &outputs);
    Ok(())
}
