//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A raw hit returned by the vector database search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: Value,
    /// Similarity reported by the server (named `distance` on the wire)
    pub score: f32,
    /// Output fields of the matched entity
    pub entity: Map<String, Value>,
}

impl SearchHit {
    /// Read a hit from either the flat shape (`{id, distance, ...fields}`)
    /// or the nested shape (`{id, distance, entity: {...}}`).
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };
        let id = map.remove("id").unwrap_or(Value::Null);
        let score = map
            .remove("distance")
            .or_else(|| map.remove("score"))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32;
        let entity = match map.remove("entity") {
            Some(Value::Object(entity)) => entity,
            _ => map,
        };
        Some(Self { id, score, entity })
    }

    pub fn entity_str(&self, key: &str) -> Option<&str> {
        self.entity.get(key).and_then(Value::as_str)
    }
}

/// Options shared by the knowledge base search operations.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub max_results: u32,
    pub similarity_threshold: f32,
    pub filter: Option<String>,
    pub include_metadata: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 5,
            similarity_threshold: 0.7,
            filter: None,
            include_metadata: true,
        }
    }
}

/// A ranked hit, shaped for retrieval-augmented generation.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub rank: usize,
    pub similarity_score: f32,
    pub document_id: Value,
    pub title: Option<String>,
    pub text_chunk: Option<String>,
    pub chunk_index: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Result of a semantic search against a knowledge base.
#[derive(Debug, Clone, Serialize)]
pub struct SemanticSearchResults {
    pub query: String,
    pub total_results: usize,
    pub search_results: Vec<RankedResult>,
    pub context_text: String,
    pub collection: String,
    pub database: String,
    #[serde(skip)]
    pub duration_ms: u64,
}

impl SemanticSearchResults {
    pub fn is_empty(&self) -> bool {
        self.search_results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.search_results.len()
    }
}

/// A retrieved passage prepared for an AI agent prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    pub content: String,
    pub source: String,
    pub relevance: f32,
}

/// Result of a context query.
#[derive(Debug, Clone, Serialize)]
pub struct ContextResult {
    pub query: String,
    pub context_chunks: Vec<ContextChunk>,
    pub context_text: String,
    pub total_context_length: usize,
    pub sources: Vec<String>,
    pub collection: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
    }

    #[test]
    fn test_hit_from_flat_shape() {
        let hit = SearchHit::from_value(json!({
            "id": 7,
            "distance": 0.91,
            "text": "hello",
            "title": "Greeting"
        }))
        .unwrap();

        assert_eq!(hit.id, json!(7));
        assert!((hit.score - 0.91).abs() < 1e-6);
        assert_eq!(hit.entity_str("text"), Some("hello"));
        assert_eq!(hit.entity.len(), 2);
    }

    #[test]
    fn test_hit_from_nested_shape() {
        let hit = SearchHit::from_value(json!({
            "id": "a1",
            "distance": 0.5,
            "entity": {"text": "nested"}
        }))
        .unwrap();

        assert_eq!(hit.id, json!("a1"));
        assert_eq!(hit.entity_str("text"), Some("nested"));
    }

    #[test]
    fn test_hit_rejects_non_object() {
        assert!(SearchHit::from_value(json!([1, 2])).is_none());
    }
}
