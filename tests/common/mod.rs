#![allow(dead_code)]

// Shared helpers for integration tests: an in-process fake of the vector database REST API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use zrag::models::ConnectionConfig;

pub const API_KEY: &str = "test-key";

/// One request seen by the fake server.
#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
struct FakeState {
    requests: Arc<Mutex<Vec<Captured>>>,
    responses: Arc<HashMap<String, (u16, Value)>>,
}

pub struct FakeServer {
    pub endpoint: String,
    state: FakeState,
}

impl FakeServer {
    /// Start a server answering `path` with `{"code": 0, "data": data}`.
    /// Unlisted paths answer with empty data.
    pub async fn start(routes: Vec<(&str, Value)>) -> Self {
        let responses = routes
            .into_iter()
            .map(|(path, data)| (path.to_string(), (200, json!({"code": 0, "data": data}))))
            .collect();
        Self::start_raw(responses).await
    }

    /// Start a server with full control over status and body per path.
    pub async fn start_raw(responses: HashMap<String, (u16, Value)>) -> Self {
        let state = FakeState {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(responses),
        };

        let app = Router::new().fallback(record).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{}/", addr),
            state,
        }
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            endpoint: self.endpoint.clone(),
            api_key: Some(API_KEY.to_string()),
            database: "default".to_string(),
            timeout_secs: 5,
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Captured> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

async fn record(
    State(state): State<FakeState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);

    state.requests.lock().unwrap().push(Captured {
        path: path.clone(),
        authorization,
        body,
    });

    let (status, response) = state
        .responses
        .get(&path)
        .cloned()
        .unwrap_or((200, json!({"code": 0, "data": {}})));
    (StatusCode::from_u16(status).unwrap(), Json(response))
}
