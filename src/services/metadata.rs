//! Chunk metadata: positions, provenance and pass-through fields.

use serde_json::{Map, Value};

use crate::models::{
    CHUNK_INDEX_KEY, CHUNK_SIZE_KEY, Chunk, ChunkRecord, Document, FieldNames,
    SOURCE_DOCUMENT_ID_KEY, TITLE_KEY, TOTAL_CHUNKS_KEY, UNTITLED,
};

/// Key of the vector in stored records.
pub const VECTOR_KEY: &str = "vector";

/// Document fields copied onto every chunk record.
///
/// The content, vector and id fields are always excluded. A non-empty
/// allow-list restricts the result to the listed fields. Input order is kept.
pub fn passthrough_fields(document: &Document, fields: &FieldNames) -> Map<String, Value> {
    let excluded = [
        fields.content_field.as_str(),
        fields.vector_field.as_str(),
        fields.id_field.as_str(),
    ];

    document
        .fields
        .iter()
        .filter(|(key, _)| !excluded.contains(&key.as_str()))
        .filter(|(key, _)| fields.metadata_fields.is_empty() || fields.metadata_fields.contains(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Turn a document's chunks into records ready for insertion.
///
/// `vector`, when given, is stored on every record.
pub fn attach_metadata(
    document: &Document,
    chunks: &[Chunk],
    fields: &FieldNames,
    vector: Option<&[f32]>,
) -> Vec<ChunkRecord> {
    let passthrough = passthrough_fields(document, fields);
    let title = document.title.as_deref().unwrap_or(UNTITLED);

    chunks
        .iter()
        .map(|chunk| {
            let mut record = Map::new();
            record.insert(fields.text_field.clone(), Value::from(chunk.text.clone()));
            record.insert(CHUNK_INDEX_KEY.to_string(), Value::from(chunk.index));
            record.insert(TOTAL_CHUNKS_KEY.to_string(), Value::from(chunk.total_chunks));
            record.insert(CHUNK_SIZE_KEY.to_string(), Value::from(chunk.char_count));
            record.insert(
                SOURCE_DOCUMENT_ID_KEY.to_string(),
                Value::from(chunk.source_document_id.clone()),
            );
            record.insert(TITLE_KEY.to_string(), Value::from(title));
            if let Some(vector) = vector {
                record.insert(VECTOR_KEY.to_string(), Value::from(vector.to_vec()));
            }

            for (key, value) in &passthrough {
                if !record.contains_key(key) {
                    record.insert(key.clone(), value.clone());
                }
            }

            ChunkRecord(record)
        })
        .collect()
}
