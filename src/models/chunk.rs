use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CHUNK_INDEX_KEY: &str = "chunkIndex";
pub const TOTAL_CHUNKS_KEY: &str = "totalChunks";
pub const CHUNK_SIZE_KEY: &str = "chunkSize";
pub const SOURCE_DOCUMENT_ID_KEY: &str = "sourceDocumentId";
pub const TITLE_KEY: &str = "title";
pub const UNTITLED: &str = "Untitled";

/// One piece of a split document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Length of `text` in characters
    pub char_count: usize,
    pub total_chunks: usize,
    pub source_document_id: String,
}

/// A chunk flattened into the record shape stored in the vector database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkRecord(pub Map<String, Value>);

impl ChunkRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn chunk_index(&self) -> Option<u64> {
        self.0.get(CHUNK_INDEX_KEY).and_then(Value::as_u64)
    }

    pub fn total_chunks(&self) -> Option<u64> {
        self.0.get(TOTAL_CHUNKS_KEY).and_then(Value::as_u64)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<ChunkRecord> for Value {
    fn from(record: ChunkRecord) -> Self {
        Value::Object(record.0)
    }
}
