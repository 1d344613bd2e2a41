//! Chunk command: split input documents into chunk records locally.

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::common::{ChunkingArgs, FieldArgs, print_records};
use crate::cli::input::{parse_items, read_input};
use crate::error::OperationError;
use crate::models::{
    Config, Document, FieldNames, IdGenerator, OutputFormat, TimestampIdGenerator, extract_vector,
};
use crate::services::{TextChunker, attach_metadata, run_items};

#[derive(Debug, Args)]
pub struct ChunkArgs {
    /// Path to a JSON or JSONL file (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    #[command(flatten)]
    pub fields: FieldArgs,
}

pub async fn handle_chunk(args: ChunkArgs, format: OutputFormat, continue_on_fail: bool) -> Result<()> {
    let config = Config::load()?;
    let chunker = args.chunking.chunker(&config.chunking)?;
    let fields = args.fields.apply(&config.fields);
    let ids = TimestampIdGenerator;

    let input = read_input(args.file.as_deref())?;
    let items = parse_items(&input)?;
    tracing::debug!(items = items.len(), "chunking input");

    let outputs = run_items(items.len(), continue_on_fail, |item_index| {
        std::future::ready(chunk_item(
            &chunker,
            &fields,
            &ids,
            &items[item_index],
            item_index,
        ))
    })
    .await?;

    print_records(format, &outputs);
    Ok(())
}

/// Chunk one item into records, carrying its vector when present.
fn chunk_item(
    chunker: &TextChunker,
    fields: &FieldNames,
    ids: &dyn IdGenerator,
    item: &Map<String, Value>,
    item_index: usize,
) -> Result<Vec<Value>, OperationError> {
    let document = Document::from_item(item, item_index, fields, ids)?;
    let vector = extract_vector(item, &fields.vector_field, item_index)?;
    let chunks = chunker.chunk(&document);

    Ok(attach_metadata(&document, &chunks, fields, vector.as_deref())
        .into_iter()
        .map(Value::from)
        .collect())
}
