//! Per-item reports returned by write operations.

use serde::Serialize;
use serde_json::Value;

/// Outcome of chunking and storing one document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub success: bool,
    pub processed_document: String,
    pub chunks_created: usize,
    pub total_characters: usize,
    pub average_chunk_size: usize,
    pub insert_count: u64,
    pub insert_ids: Vec<Value>,
    pub collection: String,
    pub database: String,
}

/// Outcome of creating a knowledge base collection.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBaseCreated {
    pub success: bool,
    pub message: String,
    pub collection: String,
    pub database: String,
    pub dimension: u32,
    pub metric_type: String,
}

/// Outcome of inserting a single record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertReport {
    pub success: bool,
    pub insert_count: u64,
    pub insert_ids: Vec<Value>,
    pub collection: String,
    pub database: String,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReport {
    pub success: bool,
    pub updated_count: usize,
    pub upsert_count: u64,
    pub collection: String,
    pub database: String,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub success: bool,
    pub deleted_count: u64,
    pub filter: String,
    pub collection: String,
    pub database: String,
}
