mod chunk;
mod collection;
mod config;
mod document;
mod report;
mod search;

pub use chunk::{
    CHUNK_INDEX_KEY, CHUNK_SIZE_KEY, Chunk, ChunkRecord, SOURCE_DOCUMENT_ID_KEY, TITLE_KEY,
    TOTAL_CHUNKS_KEY, UNTITLED,
};
pub use collection::{CollectionSpec, IndexType, MetricType, validate_collection_name};
pub use config::{
    ChunkingConfig, CollectionDefaults, Config, ConnectionConfig, DEFAULT_DATABASE,
    DEFAULT_ENDPOINT, ENV_API_KEY, ENV_DATABASE, ENV_ENDPOINT, MAX_CHUNK_SIZE, SearchConfig,
    ShortDocumentPolicy, SplitStrategy,
};
pub use document::{
    Document, FieldNames, IdGenerator, SequentialIdGenerator, TimestampIdGenerator,
    extract_vector, parse_query_vector,
};
pub use report::{
    DeleteReport, IngestReport, InsertReport, KnowledgeBaseCreated, UpsertReport,
};
pub use search::{
    ContextChunk, ContextResult, OutputFormat, RankedResult, SearchHit, SearchOptions,
    SemanticSearchResults,
};
