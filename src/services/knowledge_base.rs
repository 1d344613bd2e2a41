//! Knowledge base operations: ingest, semantic search and context retrieval.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Instant;

use crate::error::{OperationError, ValidationError};
use crate::models::{
    CHUNK_INDEX_KEY, CollectionSpec, ContextChunk, ContextResult, Document, FieldNames,
    IdGenerator, IngestReport, KnowledgeBaseCreated, RankedResult, SearchHit, SearchOptions,
    SemanticSearchResults, TITLE_KEY, TimestampIdGenerator, UNTITLED, extract_vector,
    validate_collection_name,
};
use crate::services::chunker::TextChunker;
use crate::services::metadata::attach_metadata;
use crate::services::vector_db::{SearchRequest, VectorDbClient};

/// Separator between blocks of a rendered context.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Label used for searches that only carry a vector.
const VECTOR_QUERY_LABEL: &str = "Vector query";

/// A collection of chunked documents in one database.
pub struct KnowledgeBase {
    client: VectorDbClient,
    database: String,
    collection: String,
    chunker: TextChunker,
    fields: FieldNames,
    ids: Box<dyn IdGenerator + Send + Sync>,
}

impl KnowledgeBase {
    pub fn new(
        client: VectorDbClient,
        database: impl Into<String>,
        collection: impl Into<String>,
        chunker: TextChunker,
        fields: FieldNames,
    ) -> Result<Self, ValidationError> {
        let collection = collection.into();
        validate_collection_name(&collection)?;

        Ok(Self {
            client,
            database: database.into(),
            collection,
            chunker,
            fields,
            ids: Box::new(TimestampIdGenerator),
        })
    }

    /// Replace the generator used for documents without an id.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + Send + Sync + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Chunk one input item and store its chunks with the item's vector.
    pub async fn process_and_store(
        &self,
        item: &Map<String, Value>,
        item_index: usize,
    ) -> Result<IngestReport, OperationError> {
        let document = Document::from_item(item, item_index, &self.fields, self.ids.as_ref())?;
        let vector = extract_vector(item, &self.fields.vector_field, item_index)?.ok_or_else(|| {
            ValidationError::MissingField {
                field: self.fields.vector_field.clone(),
                item_index,
            }
        })?;

        let processed = self.chunker.normalize(&document.content);
        let chunks = self.chunker.chunk_normalized(&document, &processed);
        let total_characters = processed.chars().count();
        let title = document
            .title
            .clone()
            .unwrap_or_else(|| UNTITLED.to_string());

        let mut report = IngestReport {
            success: true,
            processed_document: title,
            chunks_created: chunks.len(),
            total_characters,
            average_chunk_size: 0,
            insert_count: 0,
            insert_ids: Vec::new(),
            collection: self.collection.clone(),
            database: self.database.clone(),
        };

        if chunks.is_empty() {
            tracing::warn!(
                item_index,
                document_id = %document.id,
                "document produced no chunks, nothing stored"
            );
            return Ok(report);
        }

        report.average_chunk_size =
            (total_characters as f64 / chunks.len() as f64).round() as usize;

        let records = attach_metadata(&document, &chunks, &self.fields, Some(&vector))
            .into_iter()
            .map(|record| record.into_inner())
            .collect();
        let written = self
            .client
            .insert(&self.database, &self.collection, records)
            .await?;

        tracing::info!(
            item_index,
            document_id = %document.id,
            chunks = chunks.len(),
            inserted = written.insert_count,
            "stored document"
        );

        report.insert_count = written.insert_count;
        report.insert_ids = written.insert_ids;
        Ok(report)
    }

    /// Rank stored chunks against a query vector.
    ///
    /// Query text alone is rejected: vectors are computed upstream.
    pub async fn semantic_search(
        &self,
        query_text: Option<&str>,
        query_vector: Option<Vec<f32>>,
        options: &SearchOptions,
    ) -> Result<SemanticSearchResults, OperationError> {
        let query_text = query_text.map(str::trim).filter(|q| !q.is_empty());
        let vector = match (query_vector, query_text) {
            (Some(vector), _) if !vector.is_empty() => vector,
            (_, None) => {
                return Err(ValidationError::InvalidValue(
                    "either query text or query vector must be provided".to_string(),
                )
                .into());
            }
            (_, Some(_)) => {
                return Err(ValidationError::InvalidValue(
                    "query vector required: compute an embedding for the query text first"
                        .to_string(),
                )
                .into());
            }
        };

        let start = Instant::now();
        let output_fields = if options.include_metadata {
            Vec::new()
        } else {
            vec![
                self.fields.text_field.clone(),
                TITLE_KEY.to_string(),
                CHUNK_INDEX_KEY.to_string(),
            ]
        };
        let request = SearchRequest::new(&self.collection, vector, options.max_results)
            .with_filter(options.filter.clone())
            .with_output_fields(output_fields);

        let hits = self.client.search(&self.database, &request).await?;
        let returned = hits.len();

        let search_results: Vec<RankedResult> = hits
            .into_iter()
            .filter(|hit| hit.score >= options.similarity_threshold)
            .enumerate()
            .map(|(position, hit)| self.rank(position + 1, hit, options.include_metadata))
            .collect();

        tracing::debug!(
            returned,
            kept = search_results.len(),
            threshold = options.similarity_threshold,
            "semantic search"
        );

        let context_text = search_results
            .iter()
            .map(|r| r.text_chunk.as_deref().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(SemanticSearchResults {
            query: query_text.unwrap_or(VECTOR_QUERY_LABEL).to_string(),
            total_results: search_results.len(),
            search_results,
            context_text,
            collection: self.collection.clone(),
            database: self.database.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Semantic search rendered as numbered context blocks for an AI agent.
    pub async fn query_with_context(
        &self,
        query_text: Option<&str>,
        query_vector: Option<Vec<f32>>,
        options: &SearchOptions,
    ) -> Result<ContextResult, OperationError> {
        let results = self
            .semantic_search(query_text, query_vector, options)
            .await?;
        Ok(build_context(results))
    }

    /// Create the backing collection.
    pub async fn create_knowledge_base(
        &self,
        spec: &CollectionSpec,
    ) -> Result<KnowledgeBaseCreated, OperationError> {
        self.client
            .create_collection(&self.database, &self.collection, spec)
            .await?;

        tracing::info!(
            collection = %self.collection,
            dimension = spec.dimension,
            metric = %spec.metric_type,
            "created knowledge base"
        );

        Ok(KnowledgeBaseCreated {
            success: true,
            message: format!(
                "Knowledge base collection '{}' created successfully",
                self.collection
            ),
            collection: self.collection.clone(),
            database: self.database.clone(),
            dimension: spec.dimension,
            metric_type: spec.metric_type.to_string(),
        })
    }

    fn rank(&self, rank: usize, hit: SearchHit, include_metadata: bool) -> RankedResult {
        let title = hit.entity_str(TITLE_KEY).map(str::to_string);
        let text_chunk = hit.entity_str(&self.fields.text_field).map(str::to_string);
        let chunk_index = hit
            .entity
            .get(CHUNK_INDEX_KEY)
            .or_else(|| hit.entity.get("chunk_index"))
            .cloned();

        RankedResult {
            rank,
            similarity_score: hit.score,
            document_id: hit.id,
            title,
            text_chunk,
            chunk_index,
            metadata: include_metadata.then_some(hit.entity),
        }
    }
}

/// Render ranked results as `[Context n]` blocks with their sources.
pub fn build_context(results: SemanticSearchResults) -> ContextResult {
    let context_chunks: Vec<ContextChunk> = results
        .search_results
        .into_iter()
        .map(|r| ContextChunk {
            content: r.text_chunk.unwrap_or_default(),
            source: r.title.unwrap_or_else(|| UNTITLED.to_string()),
            relevance: r.similarity_score,
        })
        .collect();

    let context_text = context_chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[Context {}] (Relevance: {:.3}, Source: {})\n{}",
                i + 1,
                chunk.relevance,
                chunk.source,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    let mut seen = HashSet::new();
    let sources = context_chunks
        .iter()
        .filter(|c| seen.insert(c.source.as_str()))
        .map(|c| c.source.clone())
        .collect();

    ContextResult {
        query: results.query,
        total_context_length: context_text.chars().count(),
        context_chunks,
        context_text,
        sources,
        collection: results.collection,
        database: results.database,
    }
}
