//! Record-level vector store operations: insert, load, query, delete and upsert.

use serde_json::{Map, Value};

use crate::error::{OperationError, ValidationError};
use crate::models::{DeleteReport, InsertReport, UpsertReport, extract_vector};
use crate::services::vector_db::{
    ALL_ENTITIES_FILTER, QueryRequest, SearchRequest, VECTOR_FIELD, VectorDbClient, ids_filter,
};

/// Key of the text in stored records.
const TEXT_KEY: &str = "text";

/// Field mapping for [`VectorStore::insert_record`].
#[derive(Debug, Clone)]
pub struct InsertOptions {
    pub text_field: String,
    pub vector_field: String,
    pub metadata_fields: Vec<String>,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            text_field: TEXT_KEY.to_string(),
            vector_field: VECTOR_FIELD.to_string(),
            metadata_fields: Vec::new(),
        }
    }
}

/// Parameters for [`VectorStore::load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub top_k: u32,
    pub filter: Option<String>,
    /// `None` requests every field.
    pub output_fields: Option<Vec<String>>,
    pub score_threshold: Option<f32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            filter: None,
            output_fields: None,
            score_threshold: None,
        }
    }
}

/// Parameters for [`VectorStore::retrieve`].
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    pub limit: u32,
    pub filter: Option<String>,
    pub include_vectors: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            limit: 50,
            filter: None,
            include_vectors: false,
        }
    }
}

impl RetrieveOptions {
    /// Output fields sent with the search request.
    pub fn output_fields(&self) -> Vec<String> {
        if self.include_vectors {
            vec!["*".to_string()]
        } else {
            vec!["id".to_string(), "*".to_string()]
        }
    }
}

/// Parse a comma-separated field list; `*` or an empty list selects every field.
pub fn parse_output_fields(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "*" {
        return None;
    }
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

/// Build the stored form of an input item.
///
/// The vector comes first, then the text, the listed metadata fields and
/// every remaining field in input order.
pub fn build_insert_record(
    item: &Map<String, Value>,
    item_index: usize,
    options: &InsertOptions,
) -> Result<Map<String, Value>, ValidationError> {
    let vector = extract_vector(item, &options.vector_field, item_index)?.ok_or_else(|| {
        ValidationError::MissingField {
            field: options.vector_field.clone(),
            item_index,
        }
    })?;

    let mut record = Map::new();
    record.insert(VECTOR_FIELD.to_string(), Value::from(vector));

    if let Some(text) = item.get(&options.text_field).filter(|v| is_present(v)) {
        record.insert(TEXT_KEY.to_string(), text.clone());
    }

    for field in &options.metadata_fields {
        if let Some(value) = item.get(field) {
            record.insert(field.clone(), value.clone());
        }
    }

    for (key, value) in item {
        if key != &options.vector_field
            && key != &options.text_field
            && !options.metadata_fields.contains(key)
        {
            record.insert(key.clone(), value.clone());
        }
    }

    Ok(record)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Operations on one collection.
pub struct VectorStore {
    client: VectorDbClient,
    database: String,
    collection: String,
}

impl VectorStore {
    pub fn new(
        client: VectorDbClient,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            client,
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Delete every entity. Failures are logged and ignored, since the
    /// collection may be empty or missing.
    pub async fn clear_collection(&self) {
        match self
            .client
            .delete(&self.database, &self.collection, ALL_ENTITIES_FILTER)
            .await
        {
            Ok(count) => tracing::info!(collection = %self.collection, deleted = ?count, "cleared collection"),
            Err(e) => tracing::warn!(collection = %self.collection, error = %e, "could not clear collection"),
        }
    }

    pub async fn insert_record(
        &self,
        item: &Map<String, Value>,
        item_index: usize,
        options: &InsertOptions,
    ) -> Result<InsertReport, OperationError> {
        let record = build_insert_record(item, item_index, options)?;
        let written = self
            .client
            .insert(&self.database, &self.collection, vec![record])
            .await?;

        Ok(InsertReport {
            success: true,
            insert_count: written.insert_count,
            insert_ids: written.insert_ids,
            collection: self.collection.clone(),
            database: self.database.clone(),
        })
    }

    /// Similarity search returning one record per hit.
    ///
    /// When nothing passes the threshold a single "No results found" record
    /// is returned instead.
    pub async fn load(
        &self,
        query_vector: Vec<f32>,
        options: &LoadOptions,
    ) -> Result<Vec<Map<String, Value>>, OperationError> {
        if query_vector.is_empty() {
            return Err(ValidationError::InvalidValue(
                "query vector must be a non-empty array of numbers".to_string(),
            )
            .into());
        }

        let request = SearchRequest::new(&self.collection, query_vector.clone(), options.top_k)
            .with_filter(options.filter.clone())
            .with_output_fields(options.output_fields.clone().unwrap_or_default());
        let hits = self.client.search(&self.database, &request).await?;

        let records: Vec<Map<String, Value>> = hits
            .into_iter()
            .filter(|hit| options.score_threshold.is_none_or(|t| hit.score >= t))
            .map(|hit| {
                let mut record = Map::new();
                record.insert("id".to_string(), hit.id);
                record.insert("score".to_string(), Value::from(hit.score));
                record.extend(hit.entity);
                record.insert(
                    "_metadata".to_string(),
                    serde_json::json!({
                        "collection": self.collection,
                        "database": self.database,
                        "searchVector": query_vector,
                    }),
                );
                record
            })
            .collect();

        if records.is_empty() {
            let mut empty = Map::new();
            empty.insert("message".to_string(), Value::from("No results found"));
            empty.insert("searchVector".to_string(), Value::from(query_vector));
            empty.insert("collection".to_string(), Value::from(self.collection.as_str()));
            empty.insert("database".to_string(), Value::from(self.database.as_str()));
            return Ok(vec![empty]);
        }

        Ok(records)
    }

    /// Plain similarity search: every hit as `{id, score, ...entity}`, no
    /// threshold and no placeholder record when nothing matches.
    pub async fn retrieve(
        &self,
        query_vector: Vec<f32>,
        options: &RetrieveOptions,
    ) -> Result<Vec<Map<String, Value>>, OperationError> {
        if query_vector.is_empty() {
            return Err(ValidationError::InvalidValue(
                "query vector must be a non-empty array of numbers".to_string(),
            )
            .into());
        }

        let request = SearchRequest::new(&self.collection, query_vector, options.limit)
            .with_filter(options.filter.clone())
            .with_output_fields(options.output_fields());
        let hits = self.client.search(&self.database, &request).await?;

        tracing::debug!(collection = %self.collection, hits = hits.len(), "retrieved");

        Ok(hits
            .into_iter()
            .map(|hit| {
                let mut record = Map::new();
                record.insert("id".to_string(), hit.id);
                record.insert("score".to_string(), Value::from(hit.score));
                record.extend(hit.entity);
                record
            })
            .collect())
    }

    pub async fn query_by_filter(
        &self,
        filter: &str,
        limit: u32,
        output_fields: Option<Vec<String>>,
    ) -> Result<Vec<Value>, OperationError> {
        let filter = require_filter(filter)?;
        let mut request = QueryRequest::new(&self.collection, filter, limit);
        if let Some(fields) = output_fields {
            request.output_fields = fields;
        }
        Ok(self.client.query(&self.database, &request).await?)
    }

    pub async fn query_by_ids(
        &self,
        ids: &[String],
        output_fields: Option<Vec<String>>,
    ) -> Result<Vec<Value>, OperationError> {
        let ids = require_ids(ids)?;
        self.query_by_filter(&ids_filter(&ids), ids.len() as u32, output_fields)
            .await
    }

    pub async fn delete_by_filter(&self, filter: &str) -> Result<DeleteReport, OperationError> {
        let filter = require_filter(filter)?;
        let deleted = self
            .client
            .delete(&self.database, &self.collection, filter)
            .await?;

        tracing::info!(collection = %self.collection, filter, deleted = ?deleted, "deleted entities");

        Ok(DeleteReport {
            success: true,
            deleted_count: deleted.unwrap_or(0),
            filter: filter.to_string(),
            collection: self.collection.clone(),
            database: self.database.clone(),
        })
    }

    pub async fn delete_by_ids(&self, ids: &[String]) -> Result<DeleteReport, OperationError> {
        let ids = require_ids(ids)?;
        self.delete_by_filter(&ids_filter(&ids)).await
    }

    /// Insert or replace records by primary key.
    pub async fn upsert(&self, data: &Value) -> Result<UpsertReport, OperationError> {
        let records = match data {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(map) => Ok(map.clone()),
                    _ => Err(ValidationError::InvalidField {
                        field: "data".to_string(),
                        item_index: index,
                        reason: "expected an object".to_string(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(ValidationError::InvalidValue(
                    "update data must be a non-empty array".to_string(),
                )
                .into());
            }
        };

        let updated_count = records.len();
        let written = self
            .client
            .upsert(&self.database, &self.collection, records)
            .await?;

        Ok(UpsertReport {
            success: true,
            updated_count,
            upsert_count: written.insert_count,
            collection: self.collection.clone(),
            database: self.database.clone(),
        })
    }
}

fn require_filter(filter: &str) -> Result<&str, ValidationError> {
    let filter = filter.trim();
    if filter.is_empty() {
        return Err(ValidationError::InvalidValue(
            "filter expression must not be empty".to_string(),
        ));
    }
    Ok(filter)
}

fn require_ids(ids: &[String]) -> Result<Vec<String>, ValidationError> {
    let ids: Vec<String> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(ValidationError::InvalidValue(
            "at least one id is required".to_string(),
        ));
    }
    Ok(ids)
}
