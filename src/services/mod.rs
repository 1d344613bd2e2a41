mod chunker;
mod knowledge_base;
mod metadata;
mod runner;
mod vector_db;
mod vector_ops;

pub use chunker::TextChunker;
pub use knowledge_base::{KnowledgeBase, build_context};
pub use metadata::{VECTOR_KEY, attach_metadata, passthrough_fields};
pub use runner::{ItemError, ItemOutput, run_items};
pub use vector_db::{
    ALL_ENTITIES_FILTER, QueryRequest, SearchRequest, VECTOR_FIELD, VectorDbClient, WriteResult,
    ids_filter,
};
pub use vector_ops::{
    InsertOptions, LoadOptions, RetrieveOptions, VectorStore, build_insert_record,
    parse_output_fields,
};
