use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ValidationError;

/// Names of the item fields the chunker reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNames {
    #[serde(default = "default_content_field")]
    pub content_field: String,

    #[serde(default = "default_title_field")]
    pub title_field: String,

    #[serde(default = "default_id_field")]
    pub id_field: String,

    #[serde(default = "default_vector_field")]
    pub vector_field: String,

    /// Field that holds the chunk text in stored records
    #[serde(default = "default_text_field")]
    pub text_field: String,

    /// When non-empty, only these fields pass through to chunk records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_fields: Vec<String>,
}

fn default_content_field() -> String {
    "content".to_string()
}

fn default_title_field() -> String {
    "title".to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_vector_field() -> String {
    "embedding".to_string()
}

fn default_text_field() -> String {
    "text".to_string()
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            content_field: default_content_field(),
            title_field: default_title_field(),
            id_field: default_id_field(),
            vector_field: default_vector_field(),
            text_field: default_text_field(),
            metadata_fields: Vec::new(),
        }
    }
}

/// Source of identifiers for documents that arrive without one.
pub trait IdGenerator {
    fn generate(&self, item_index: usize) -> String;
}

/// `doc_<unix millis>_<item index>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampIdGenerator;

impl IdGenerator for TimestampIdGenerator {
    fn generate(&self, item_index: usize) -> String {
        format!(
            "doc_{}_{}",
            chrono::Utc::now().timestamp_millis(),
            item_index
        )
    }
}

/// Deterministic `<prefix>_<n>` identifiers, counting from zero.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicUsize,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicUsize::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, _item_index: usize) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", self.prefix, n)
    }
}

/// A single input document, read from one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub title: Option<String>,
    /// Every field of the originating item, in input order
    pub fields: Map<String, Value>,
}

impl Document {
    /// Build a document from an input item.
    ///
    /// The content field must be a non-empty string. The id is taken from the
    /// id field when it holds a string or number, otherwise synthesized.
    pub fn from_item(
        item: &Map<String, Value>,
        item_index: usize,
        fields: &FieldNames,
        ids: &dyn IdGenerator,
    ) -> Result<Self, ValidationError> {
        let content = match item.get(&fields.content_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            None | Some(Value::Null) | Some(Value::String(_)) => {
                return Err(ValidationError::MissingField {
                    field: fields.content_field.clone(),
                    item_index,
                });
            }
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: fields.content_field.clone(),
                    item_index,
                    reason: "expected a string".to_string(),
                });
            }
        };

        let title = item
            .get(&fields.title_field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let id = match item.get(&fields.id_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => ids.generate(item_index),
        };

        Ok(Self {
            id,
            content,
            title,
            fields: item.clone(),
        })
    }
}

/// Read a vector from an item field.
///
/// Returns `Ok(None)` when the field is absent; any other non numeric-array
/// value is rejected.
pub fn extract_vector(
    item: &Map<String, Value>,
    field: &str,
    item_index: usize,
) -> Result<Option<Vec<f32>>, ValidationError> {
    match item.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_vector_value(value)
            .map(Some)
            .map_err(|reason| ValidationError::InvalidField {
                field: field.to_string(),
                item_index,
                reason,
            }),
    }
}

/// Parse a query vector given as a JSON array string, e.g. `[0.1, 0.2]`.
pub fn parse_query_vector(raw: &str) -> Result<Vec<f32>, ValidationError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ValidationError::InvalidValue(format!("invalid query vector JSON: {}", e)))?;
    parse_vector_value(&value).map_err(|reason| {
        ValidationError::InvalidValue(format!("invalid query vector: {}", reason))
    })
}

fn parse_vector_value(value: &Value) -> Result<Vec<f32>, String> {
    let Value::Array(items) = value else {
        return Err("vector must be an array of numbers".to_string());
    };
    if items.is_empty() {
        return Err("vector must be a non-empty array of numbers".to_string());
    }
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| "vector must be an array of numbers".to_string())
        })
        .collect()
}
