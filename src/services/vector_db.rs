//! REST client for a Milvus/Zilliz compatible vector database (v2 API).

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

use crate::error::VectorStoreError;
use crate::models::{CollectionSpec, ConnectionConfig, SearchHit};

/// Filter expression matching every entity of an auto-id collection.
pub const ALL_ENTITIES_FILTER: &str = "id >= 0";

/// Name of the vector field in collections created by this client.
pub const VECTOR_FIELD: &str = "vector";

const TEXT_MAX_LENGTH: u32 = 65535;

/// Render an `id in [...]` filter expression.
pub fn ids_filter(ids: &[String]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| Value::from(id.as_str()).to_string())
        .collect();
    format!("id in [{}]", quoted.join(","))
}

/// Response envelope shared by every v2 endpoint.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: Option<String>,
}

/// Result of an insert or upsert call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    #[serde(default, alias = "upsertCount")]
    pub insert_count: u64,
    #[serde(default, alias = "upsertIds")]
    pub insert_ids: Vec<Value>,
}

/// A vector similarity search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub collection_name: String,
    pub data: Vec<Vec<f32>>,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub output_fields: Vec<String>,
}

impl SearchRequest {
    pub fn new(collection: impl Into<String>, vector: Vec<f32>, limit: u32) -> Self {
        Self {
            collection_name: collection.into(),
            data: vec![vector],
            limit,
            filter: None,
            output_fields: vec!["*".to_string()],
        }
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.trim().is_empty());
        self
    }

    pub fn with_output_fields(mut self, fields: Vec<String>) -> Self {
        if !fields.is_empty() {
            self.output_fields = fields;
        }
        self
    }
}

/// A scalar filter query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub collection_name: String,
    pub filter: String,
    pub output_fields: Vec<String>,
    pub limit: u32,
}

impl QueryRequest {
    pub fn new(collection: impl Into<String>, filter: impl Into<String>, limit: u32) -> Self {
        Self {
            collection_name: collection.into(),
            filter: filter.into(),
            output_fields: vec!["*".to_string()],
            limit,
        }
    }
}

/// Client for the vector database REST API.
#[derive(Debug, Clone)]
pub struct VectorDbClient {
    client: Client,
    base_url: String,
}

impl VectorDbClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: &ConnectionConfig) -> Result<Self, VectorStoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| VectorStoreError::ConnectionError(format!("invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_collections(&self, database: &str) -> Result<Vec<String>, VectorStoreError> {
        let data = self
            .post(database, "/v2/vectordb/collections/list", json!({}))
            .await?;

        let names = match data {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name),
                    Value::Object(mut map) => match map.remove("collectionName") {
                        Some(Value::String(name)) => Some(name),
                        _ => None,
                    },
                    _ => None,
                })
                .collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(VectorStoreError::InvalidResponse(format!(
                    "expected a list of collections, got {}",
                    other
                )));
            }
        };
        Ok(names)
    }

    /// Create a collection with an auto-id primary key, a float vector and a text field.
    pub async fn create_collection(
        &self,
        database: &str,
        name: &str,
        spec: &CollectionSpec,
    ) -> Result<(), VectorStoreError> {
        let body = json!({
            "collectionName": name,
            "schema": {
                "fields": [
                    {"fieldName": "id", "dataType": "Int64", "isPrimary": true, "autoID": true},
                    {"fieldName": VECTOR_FIELD, "dataType": "FloatVector", "dimension": spec.dimension},
                    {"fieldName": "text", "dataType": "VarChar", "maxLength": TEXT_MAX_LENGTH}
                ]
            },
            "indexParams": [{
                "fieldName": VECTOR_FIELD,
                "indexName": "vector_index",
                "metricType": spec.metric_type.to_string(),
                "indexType": spec.index_type.to_string()
            }]
        });

        self.post(database, "/v2/vectordb/collections/create", body)
            .await?;
        Ok(())
    }

    pub async fn describe_collection(
        &self,
        database: &str,
        name: &str,
    ) -> Result<Value, VectorStoreError> {
        self.post(
            database,
            "/v2/vectordb/collections/describe",
            json!({ "collectionName": name }),
        )
        .await
    }

    pub async fn drop_collection(&self, database: &str, name: &str) -> Result<(), VectorStoreError> {
        self.post(
            database,
            "/v2/vectordb/collections/drop",
            json!({ "collectionName": name }),
        )
        .await?;
        Ok(())
    }

    pub async fn insert(
        &self,
        database: &str,
        collection: &str,
        records: Vec<Map<String, Value>>,
    ) -> Result<WriteResult, VectorStoreError> {
        self.write(database, "/v2/vectordb/entities/insert", collection, records)
            .await
    }

    pub async fn upsert(
        &self,
        database: &str,
        collection: &str,
        records: Vec<Map<String, Value>>,
    ) -> Result<WriteResult, VectorStoreError> {
        self.write(database, "/v2/vectordb/entities/upsert", collection, records)
            .await
    }

    /// Run a similarity search and return the hits for the first query vector.
    pub async fn search(
        &self,
        database: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let body = serde_json::to_value(request)
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;
        let data = self
            .post(database, "/v2/vectordb/entities/search", body)
            .await?;

        let hits = match data {
            Value::Array(items) => match items.first() {
                // One result list per query vector.
                Some(Value::Array(_)) => match items.into_iter().next() {
                    Some(Value::Array(first)) => first,
                    _ => Vec::new(),
                },
                _ => items,
            },
            Value::Null => Vec::new(),
            other => {
                return Err(VectorStoreError::InvalidResponse(format!(
                    "expected a list of search hits, got {}",
                    other
                )));
            }
        };

        Ok(hits.into_iter().filter_map(SearchHit::from_value).collect())
    }

    pub async fn query(
        &self,
        database: &str,
        request: &QueryRequest,
    ) -> Result<Vec<Value>, VectorStoreError> {
        let body = serde_json::to_value(request)
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;
        let data = self
            .post(database, "/v2/vectordb/entities/query", body)
            .await?;

        match data {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(VectorStoreError::InvalidResponse(format!(
                "expected a list of entities, got {}",
                other
            ))),
        }
    }

    /// Delete the entities matching `filter`. Returns the server's delete count when reported.
    pub async fn delete(
        &self,
        database: &str,
        collection: &str,
        filter: &str,
    ) -> Result<Option<u64>, VectorStoreError> {
        let data = self
            .post(
                database,
                "/v2/vectordb/entities/delete",
                json!({ "collectionName": collection, "filter": filter }),
            )
            .await?;
        Ok(data.get("deleteCount").and_then(Value::as_u64))
    }

    async fn write(
        &self,
        database: &str,
        path: &str,
        collection: &str,
        records: Vec<Map<String, Value>>,
    ) -> Result<WriteResult, VectorStoreError> {
        let data = self
            .post(
                database,
                path,
                json!({ "collectionName": collection, "data": records }),
            )
            .await?;

        if data.is_null() {
            return Ok(WriteResult::default());
        }
        serde_json::from_value(data).map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
    }

    /// POST `body` with `dbName` added and unwrap the response envelope.
    async fn post(&self, database: &str, path: &str, body: Value) -> Result<Value, VectorStoreError> {
        let url = format!("{}{}", self.base_url, path);
        let mut body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("dbName".to_string(), Value::from(database));

        tracing::debug!(%url, "vector database request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    VectorStoreError::ConnectionError(e.to_string())
                } else {
                    VectorStoreError::RequestError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorStoreError::ServerError {
                code: i64::from(status.as_u16()),
                message: body,
            });
        }

        let envelope: ApiResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;

        if envelope.code != 0 {
            return Err(VectorStoreError::ServerError {
                code: envelope.code,
                message: envelope
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = VectorDbClient::new(&ConnectionConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trimming() {
        let config = ConnectionConfig {
            endpoint: "https://in01.example.zillizcloud.com//".to_string(),
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let client = VectorDbClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://in01.example.zillizcloud.com");
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let config = ConnectionConfig {
            api_key: Some("bad\nkey".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            VectorDbClient::new(&config),
            Err(VectorStoreError::ConnectionError(_))
        ));
    }

    #[test]
    fn test_ids_filter() {
        let ids = vec!["a".to_string(), "b\"c".to_string()];
        assert_eq!(ids_filter(&ids), r#"id in ["a","b\"c"]"#);
        assert_eq!(ids_filter(&[]), "id in []");
    }

    #[test]
    fn test_search_request_body() {
        let request = SearchRequest::new("docs", vec![0.5, 1.0], 3)
            .with_filter(Some("  ".to_string()))
            .with_output_fields(Vec::new());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "collectionName": "docs",
                "data": [[0.5, 1.0]],
                "limit": 3,
                "outputFields": ["*"]
            })
        );
    }

    #[test]
    fn test_write_result_accepts_upsert_names() {
        let result: WriteResult =
            serde_json::from_value(json!({"upsertCount": 2, "upsertIds": [1, 2]})).unwrap();
        assert_eq!(result.insert_count, 2);
        assert_eq!(result.insert_ids, vec![json!(1), json!(2)]);
    }
}
