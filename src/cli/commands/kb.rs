//! Knowledge base commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::common::{ChunkingArgs, FieldArgs, SearchArgs, TargetArgs, connect, print_records};
use crate::cli::input::{parse_items, read_input};
use crate::cli::output::get_formatter;
use crate::models::{
    CollectionSpec, Config, FieldNames, MetricType, OutputFormat, parse_query_vector,
};
use crate::services::{KnowledgeBase, TextChunker, run_items};

#[derive(Debug, Subcommand)]
pub enum KbCommand {
    /// Chunk documents and store them with their vectors
    Ingest(IngestArgs),
    /// Rank stored chunks against a query vector
    Search(KbSearchArgs),
    /// Search and render the hits as context for an AI agent
    Context(KbSearchArgs),
    /// Create a knowledge base collection
    Create(CreateArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Path to a JSON or JSONL file (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Debug, Args)]
pub struct KbSearchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub search: SearchArgs,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Vector dimension
    #[arg(long)]
    pub dimension: Option<u32>,

    /// Similarity metric: COSINE, L2, or IP
    #[arg(long)]
    pub metric: Option<MetricType>,
}

pub async fn handle_kb(cmd: KbCommand, format: OutputFormat, continue_on_fail: bool) -> Result<()> {
    let config = Config::load()?;

    match cmd {
        KbCommand::Ingest(args) => handle_ingest(args, &config, format, continue_on_fail).await,
        KbCommand::Search(args) => handle_search(args, &config, format).await,
        KbCommand::Context(args) => handle_context(args, &config, format).await,
        KbCommand::Create(args) => handle_create(args, &config, format).await,
    }
}

fn open_kb(
    target: &TargetArgs,
    config: &Config,
    chunker: TextChunker,
    fields: FieldNames,
) -> Result<KnowledgeBase> {
    let client = connect(config)?;
    KnowledgeBase::new(
        client,
        target.database(config),
        target.collection.as_str(),
        chunker,
        fields,
    )
    .context("invalid knowledge base")
}

async fn handle_ingest(
    args: IngestArgs,
    config: &Config,
    format: OutputFormat,
    continue_on_fail: bool,
) -> Result<()> {
    let chunker = args.chunking.chunker(&config.chunking)?;
    let fields = args.fields.apply(&config.fields);
    let kb = open_kb(&args.target, config, chunker, fields)?;

    let input = read_input(args.file.as_deref())?;
    let items = parse_items(&input)?;
    if items.is_empty() {
        println!(
            "{}",
            get_formatter(format).format_message("No documents found in input.")
        );
        return Ok(());
    }

    tracing::info!(
        documents = items.len(),
        collection = kb.collection(),
        "ingesting documents"
    );

    let kb = &kb;
    let items = &items;
    let outputs = run_items(items.len(), continue_on_fail, |item_index| async move {
        let report = kb.process_and_store(&items[item_index], item_index).await?;
        Ok::<_, anyhow::Error>(vec![serde_json::to_value(report)?])
    })
    .await?;

    print_records(format, &outputs);
    Ok(())
}

fn query_vector(args: &SearchArgs) -> Result<Option<Vec<f32>>> {
    args.vector
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(parse_query_vector)
        .transpose()
        .context("invalid --vector")
}

async fn handle_search(args: KbSearchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let options = args.search.options(config)?;
    let vector = query_vector(&args.search)?;
    let kb = open_kb(
        &args.target,
        config,
        TextChunker::with_defaults(),
        config.fields.clone(),
    )?;

    let results = kb
        .semantic_search(args.search.query.as_deref(), vector, &options)
        .await
        .context("semantic search failed")?;

    let formatter = get_formatter(format);
    print!("{}", formatter.format_search_results(&results));
    Ok(())
}

async fn handle_context(args: KbSearchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let options = args.search.options(config)?;
    let vector = query_vector(&args.search)?;
    let kb = open_kb(
        &args.target,
        config,
        TextChunker::with_defaults(),
        config.fields.clone(),
    )?;

    let context = kb
        .query_with_context(args.search.query.as_deref(), vector, &options)
        .await
        .context("context query failed")?;

    let formatter = get_formatter(format);
    print!("{}", formatter.format_context(&context));
    Ok(())
}

async fn handle_create(args: CreateArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let spec = CollectionSpec {
        dimension: args.dimension.unwrap_or(config.collection.dimension),
        metric_type: args.metric.unwrap_or(config.collection.metric_type),
        index_type: config.collection.index_type,
    };
    if spec.dimension == 0 {
        anyhow::bail!("dimension must be at least 1");
    }

    let kb = open_kb(
        &args.target,
        config,
        TextChunker::with_defaults(),
        config.fields.clone(),
    )?;
    let created = kb
        .create_knowledge_base(&spec)
        .await
        .context("failed to create knowledge base")?;

    let formatter = get_formatter(format);
    match format {
        OutputFormat::Json => println!(
            "{}",
            formatter.format_value("Knowledge base", &serde_json::to_value(&created)?)
        ),
        _ => println!("{}", formatter.format_message(&created.message)),
    }
    Ok(())
}
