//! Knowledge base flows against an in-process fake server.

mod common;

use common::FakeServer;
use serde_json::{Map, Value, json};
use zrag::models::{ChunkingConfig, FieldNames, SearchOptions, SequentialIdGenerator};
use zrag::services::{KnowledgeBase, TextChunker, VectorDbClient, run_items};

const INSERT_PATH: &str = "/v2/vectordb/entities/insert";
const SEARCH_PATH: &str = "/v2/vectordb/entities/search";

fn knowledge_base(server: &FakeServer, chunking: ChunkingConfig) -> KnowledgeBase {
    let client = VectorDbClient::new(&server.connection()).unwrap();
    KnowledgeBase::new(
        client,
        "default",
        "articles",
        TextChunker::new(chunking).unwrap(),
        FieldNames::default(),
    )
    .unwrap()
    .with_id_generator(SequentialIdGenerator::new("doc"))
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

#[tokio::test]
async fn process_and_store_inserts_chunk_records() {
    let server = FakeServer::start(vec![(
        INSERT_PATH,
        json!({"insertCount": 2, "insertIds": [1, 2]}),
    )])
    .await;
    let kb = knowledge_base(
        &server,
        ChunkingConfig {
            split_strategy: Some(zrag::models::SplitStrategy::Characters),
            ..Default::default()
        },
    );

    let item = object(json!({
        "content": "a".repeat(1500),
        "title": "Long read",
        "embedding": [0.1, 0.2],
        "author": "kim"
    }));
    let report = kb.process_and_store(&item, 0).await.unwrap();

    assert!(report.success);
    assert_eq!(report.processed_document, "Long read");
    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.total_characters, 1500);
    assert_eq!(report.average_chunk_size, 750);
    assert_eq!(report.insert_count, 2);
    assert_eq!(report.collection, "articles");

    let inserts = server.requests_to(INSERT_PATH);
    assert_eq!(inserts.len(), 1);
    let body = &inserts[0].body;
    assert_eq!(body["collectionName"], json!("articles"));

    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["text"].as_str().unwrap().len(), 1000);
    assert_eq!(records[1]["text"].as_str().unwrap().len(), 700);
    assert_eq!(records[1]["chunkIndex"], json!(1));
    assert_eq!(records[1]["totalChunks"], json!(2));
    assert_eq!(records[1]["sourceDocumentId"], json!("doc_0"));
    assert_eq!(records[1]["title"], json!("Long read"));
    assert_eq!(records[1]["author"], json!("kim"));
    assert!(records[1]["vector"].is_array());
    assert!(records[1].get("content").is_none());
    assert!(records[1].get("embedding").is_none());
}

#[tokio::test]
async fn continue_on_fail_reports_bad_items_inline() {
    let server = FakeServer::start(vec![(
        INSERT_PATH,
        json!({"insertCount": 1, "insertIds": [7]}),
    )])
    .await;
    let kb = knowledge_base(&server, ChunkingConfig::default());

    let items = vec![
        object(json!({
            "content": "This document is long enough to produce one chunk of text for storage.",
            "embedding": [1.0]
        })),
        object(json!({"content": "", "embedding": [1.0]})),
        object(json!({"content": "No vector attached to this document at all, so it fails."})),
    ];

    let kb = &kb;
    let items = &items;
    let outputs = run_items(items.len(), true, |i| async move {
        let report = kb.process_and_store(&items[i], i).await?;
        Ok::<_, anyhow::Error>(vec![serde_json::to_value(report)?])
    })
    .await
    .unwrap();

    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[0].json["insert_count"], json!(1));
    assert_eq!(
        outputs[1].json,
        json!({"error": "field 'content' not found or empty (item 1)"})
    );
    assert_eq!(
        outputs[2].json,
        json!({"error": "field 'embedding' not found or empty (item 2)"})
    );
    assert_eq!(server.requests_to(INSERT_PATH).len(), 1);
}

#[tokio::test]
async fn semantic_search_filters_and_ranks() {
    let server = FakeServer::start(vec![(
        SEARCH_PATH,
        json!([[
            {"id": 1, "distance": 0.92, "entity": {"text": "Rust ownership", "title": "Book", "chunkIndex": 0}},
            {"id": 2, "distance": 0.71, "entity": {"text": "Borrowing rules", "title": "Guide", "chunkIndex": 3}},
            {"id": 3, "distance": 0.40, "entity": {"text": "Unrelated", "title": "Noise", "chunkIndex": 1}}
        ]]),
    )])
    .await;
    let kb = knowledge_base(&server, ChunkingConfig::default());

    let options = SearchOptions {
        include_metadata: false,
        ..Default::default()
    };
    let results = kb
        .semantic_search(Some("ownership"), Some(vec![0.3, 0.4]), &options)
        .await
        .unwrap();

    assert_eq!(results.query, "ownership");
    assert_eq!(results.total_results, 2);
    assert_eq!(results.search_results[0].rank, 1);
    assert_eq!(results.search_results[1].rank, 2);
    assert_eq!(results.search_results[1].document_id, json!(2));
    assert_eq!(results.search_results[1].chunk_index, Some(json!(3)));
    assert!(results.search_results[0].metadata.is_none());
    assert_eq!(results.context_text, "Rust ownership\n\nBorrowing rules");

    let body = &server.requests_to(SEARCH_PATH)[0].body;
    assert_eq!(body["limit"], json!(5));
    assert_eq!(body["outputFields"], json!(["text", "title", "chunkIndex"]));
    assert!(body.get("filter").is_none());
}

#[tokio::test]
async fn query_with_context_renders_blocks() {
    let server = FakeServer::start(vec![(
        SEARCH_PATH,
        json!([
            {"id": 1, "distance": 0.9, "text": "First passage", "title": "Book"},
            {"id": 2, "distance": 0.8, "text": "Second passage", "title": "Book"}
        ]),
    )])
    .await;
    let kb = knowledge_base(&server, ChunkingConfig::default());

    let context = kb
        .query_with_context(None, Some(vec![1.0]), &SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(context.query, "Vector query");
    assert_eq!(
        context.context_text,
        "[Context 1] (Relevance: 0.900, Source: Book)\nFirst passage\n\n---\n\n\
         [Context 2] (Relevance: 0.800, Source: Book)\nSecond passage"
    );
    assert_eq!(context.sources, vec!["Book"]);
    assert_eq!(context.total_context_length, context.context_text.len());
}

#[tokio::test]
async fn create_knowledge_base_reports_settings() {
    let server = FakeServer::start(vec![]).await;
    let kb = knowledge_base(&server, ChunkingConfig::default());

    let created = kb
        .create_knowledge_base(&zrag::models::CollectionSpec::default())
        .await
        .unwrap();

    assert!(created.success);
    assert_eq!(created.dimension, 1536);
    assert_eq!(created.metric_type, "COSINE");
    assert_eq!(
        created.message,
        "Knowledge base collection 'articles' created successfully"
    );
    let body = &server.requests_to("/v2/vectordb/collections/create")[0].body;
    assert_eq!(body["schema"]["fields"][1]["dimension"], json!(1536));
}
