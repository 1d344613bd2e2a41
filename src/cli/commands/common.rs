//! Arguments and helpers shared by several commands.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::input::split_list;
use crate::cli::output::get_formatter;
use crate::models::{
    ChunkingConfig, Config, FieldNames, OutputFormat, SearchOptions, ShortDocumentPolicy,
    SplitStrategy,
};
use crate::services::{ItemOutput, TextChunker, VectorDbClient};

/// Which collection (and database) a command operates on.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Collection name
    #[arg(long, short = 'c')]
    pub collection: String,

    /// Database name (defaults to the configured database)
    #[arg(long, short = 'd')]
    pub database: Option<String>,
}

impl TargetArgs {
    pub fn database<'a>(&'a self, config: &'a Config) -> &'a str {
        self.database
            .as_deref()
            .unwrap_or(config.connection.database.as_str())
    }
}

/// Overrides for the configured chunking settings.
#[derive(Debug, Args, Default)]
pub struct ChunkingArgs {
    /// Maximum characters per chunk (1-5000)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared between consecutive chunks
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Drop chunks shorter than this
    #[arg(long)]
    pub min_chunk_size: Option<usize>,

    /// Split strategy: sentences, paragraphs, or characters
    #[arg(long)]
    pub strategy: Option<SplitStrategy>,

    /// Keep whitespace as is
    #[arg(long)]
    pub no_clean: bool,

    /// Also drop characters other than letters, digits and basic punctuation
    #[arg(long)]
    pub strict_clean: bool,

    /// Keep HTML tags and entities
    #[arg(long)]
    pub keep_html: bool,

    /// What to do with documents shorter than the minimum chunk size: drop or keep
    #[arg(long)]
    pub short_document: Option<ShortDocumentPolicy>,
}

impl ChunkingArgs {
    pub fn apply(&self, base: &ChunkingConfig) -> ChunkingConfig {
        let mut config = base.clone();
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunk_overlap = overlap;
        }
        if let Some(min) = self.min_chunk_size {
            config.min_chunk_size = min;
        }
        if self.strategy.is_some() {
            config.split_strategy = self.strategy;
        }
        if self.no_clean {
            config.clean_text = false;
        }
        if self.strict_clean {
            config.strict_clean = true;
        }
        if self.keep_html {
            config.remove_html = false;
        }
        if let Some(policy) = self.short_document {
            config.short_document = policy;
        }
        config
    }

    pub fn chunker(&self, base: &ChunkingConfig) -> Result<TextChunker> {
        TextChunker::new(self.apply(base)).context("invalid chunking settings")
    }
}

/// Overrides for the configured input and output field names.
#[derive(Debug, Args, Default)]
pub struct FieldArgs {
    /// Field holding the document text
    #[arg(long)]
    pub content_field: Option<String>,

    /// Field holding the document title
    #[arg(long)]
    pub title_field: Option<String>,

    /// Field holding the document id
    #[arg(long)]
    pub id_field: Option<String>,

    /// Field holding the document vector
    #[arg(long)]
    pub vector_field: Option<String>,

    /// Field that receives the chunk text
    #[arg(long)]
    pub text_field: Option<String>,

    /// Only pass these fields through to chunk records (comma-separated)
    #[arg(long)]
    pub metadata_fields: Option<String>,
}

impl FieldArgs {
    pub fn apply(&self, base: &FieldNames) -> FieldNames {
        let pick = |value: &Option<String>, fallback: &String| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map_or_else(|| fallback.clone(), str::to_string)
        };

        FieldNames {
            content_field: pick(&self.content_field, &base.content_field),
            title_field: pick(&self.title_field, &base.title_field),
            id_field: pick(&self.id_field, &base.id_field),
            vector_field: pick(&self.vector_field, &base.vector_field),
            text_field: pick(&self.text_field, &base.text_field),
            metadata_fields: self
                .metadata_fields
                .as_deref()
                .map_or_else(|| base.metadata_fields.clone(), split_list),
        }
    }
}

/// Query settings for knowledge base searches.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Query text (a label only; the vector drives the search)
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Query vector as a JSON array, e.g. '[0.1, 0.2]'
    #[arg(long)]
    pub vector: Option<String>,

    /// Maximum number of results
    #[arg(long, short = 'n')]
    pub max_results: Option<u32>,

    /// Minimum similarity score (0.0-1.0)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Filter expression, e.g. 'lang == "en"'
    #[arg(long)]
    pub filter: Option<String>,

    /// Return only text, title and chunk index
    #[arg(long)]
    pub no_metadata: bool,
}

impl SearchArgs {
    pub fn options(&self, config: &Config) -> Result<SearchOptions> {
        let max_results = self.max_results.unwrap_or(config.search.max_results);
        if max_results == 0 {
            anyhow::bail!("max results must be at least 1");
        }

        let threshold = self
            .threshold
            .unwrap_or(config.search.similarity_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("threshold must be between 0.0 and 1.0");
        }

        Ok(SearchOptions {
            max_results,
            similarity_threshold: threshold,
            filter: self.filter.clone(),
            include_metadata: !self.no_metadata,
        })
    }
}

/// Entity selection by filter expression or id list.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SelectionArgs {
    /// Filter expression, e.g. 'chunkIndex > 2'
    #[arg(long)]
    pub filter: Option<String>,

    /// Comma-separated ids
    #[arg(long)]
    pub ids: Option<String>,
}

pub fn connect(config: &Config) -> Result<VectorDbClient> {
    VectorDbClient::new(&config.connection).with_context(|| {
        format!(
            "failed to create client for {}",
            config.connection.endpoint
        )
    })
}

pub fn print_records(format: OutputFormat, records: &[ItemOutput]) {
    let formatter = get_formatter(format);
    print!("{}", formatter.format_records(records));
    if format == OutputFormat::Json {
        println!();
    }
}

/// Ask for a y/N confirmation on stdin.
pub fn confirm(prompt: &str) -> Result<bool> {
    println!("{} [y/N]", prompt);
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
