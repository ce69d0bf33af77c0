//! End-to-end orchestration tests over recording in-memory doubles.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use ragkit::providers::{Completion, CompletionRequest, MockTextModel, TextModel};
use ragkit::rag::{GenerationOptions, IngestContext, RagService, SearchContext};
use ragkit::stores::{
    CollectionInfo, Filter, PointStruct, ScoredPoint, SearchQuery, VectorStore,
};
use ragkit::types::RagError;

/// In-memory store that records every call and can be told to fail a
/// specific upsert.
#[derive(Default)]
struct RecordingStore {
    collections: Mutex<Vec<String>>,
    created: Mutex<Vec<(String, usize)>>,
    upserts: Mutex<Vec<(String, Vec<PointStruct>)>>,
    searches: Mutex<Vec<(String, SearchQuery)>>,
    deleted_filters: Mutex<Vec<(String, Filter)>>,
    payload_updates: Mutex<Vec<(String, serde_json::Value, Filter)>>,
    search_results: Mutex<Vec<ScoredPoint>>,
    fail_upsert_at: Option<usize>,
}

impl RecordingStore {
    fn with_results(results: Vec<ScoredPoint>) -> Self {
        let store = Self::default();
        *store.search_results.lock() = results;
        store
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, RagError> {
        Ok(self
            .collections
            .lock()
            .iter()
            .map(|name| CollectionInfo { name: name.clone() })
            .collect())
    }

    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<(), RagError> {
        self.collections.lock().push(name.to_string());
        self.created.lock().push((name.to_string(), vector_size));
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<(), RagError> {
        let count = self.upserts.lock().len();
        if self.fail_upsert_at == Some(count) {
            return Err(RagError::Store("injected upsert failure".to_string()));
        }
        self.upserts.lock().push((collection.to_string(), points));
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: SearchQuery,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        self.searches.lock().push((collection.to_string(), query));
        Ok(self.search_results.lock().clone())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), RagError> {
        self.collections.lock().retain(|c| c != name);
        Ok(())
    }

    async fn delete_points(&self, collection: &str, filter: &Filter) -> Result<(), RagError> {
        self.deleted_filters
            .lock()
            .push((collection.to_string(), filter.clone()));
        Ok(())
    }

    async fn set_payload(
        &self,
        collection: &str,
        payload: serde_json::Value,
        filter: &Filter,
    ) -> Result<(), RagError> {
        self.payload_updates
            .lock()
            .push((collection.to_string(), payload, filter.clone()));
        Ok(())
    }
}

/// Model whose embeddings are always empty, for the degenerate-query path.
struct EmptyEmbedModel;

#[async_trait]
impl TextModel for EmptyEmbedModel {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RagError> {
        Ok(Vec::new())
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, RagError> {
        Ok(Completion::from_raw(json!({"response": ""})))
    }
}

fn service(store: Arc<RecordingStore>, model: Arc<MockTextModel>) -> RagService {
    RagService::new(store, model, "test-model")
}

fn hit(source: &str, score: f32) -> ScoredPoint {
    ScoredPoint {
        score,
        payload: json!({"source": source}),
    }
}

#[tokio::test]
async fn ingest_creates_the_collection_exactly_once() {
    let store = Arc::new(RecordingStore::default());
    let svc = service(store.clone(), Arc::new(MockTextModel::new("")));

    let context = IngestContext {
        collection: "notes".to_string(),
        ..IngestContext::default()
    };
    let first = svc.embed_text("A short note.", &context).await.unwrap();
    let second = svc.embed_text("Another note.", &context).await.unwrap();

    assert!(first.collection_created);
    assert!(!second.collection_created);
    let created = store.created.lock();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0], ("notes".to_string(), 8));
}

#[tokio::test]
async fn ingest_writes_one_point_per_chunk_with_full_payload() {
    let store = Arc::new(RecordingStore::default());
    let svc = service(store.clone(), Arc::new(MockTextModel::new("")));

    let context = IngestContext {
        collection: "docs".to_string(),
        tags: vec!["rust".to_string()],
        key: Some("doc-1".to_string()),
        kind: Some("article".to_string()),
        title: Some("Splitting".to_string()),
    };
    // Long enough to segment into several chunks under the ingest profile.
    let text = "word ".repeat(600);
    let report = svc.embed_text(&text, &context).await.unwrap();

    assert_eq!(report.chunks_written, 3);
    let upserts = store.upserts.lock();
    assert_eq!(upserts.len(), 3);
    for (collection, points) in upserts.iter() {
        assert_eq!(collection, "docs");
        assert_eq!(points.len(), 1);
        let payload = &points[0].payload;
        // The title prefix is baked into the stored source text.
        assert!(
            payload["source"]
                .as_str()
                .unwrap()
                .starts_with("Title: Splitting\n\nword")
        );
        assert_eq!(payload["tags"], json!(["rust"]));
        assert_eq!(payload["key"], "doc-1");
        assert_eq!(payload["type"], "article");
        assert_eq!(payload["title"], "Splitting");
        assert!(payload["timestamp"].is_string());
    }
}

#[tokio::test]
async fn ingest_failure_leaves_earlier_points_in_place() {
    let store = Arc::new(RecordingStore {
        fail_upsert_at: Some(1),
        ..RecordingStore::default()
    });
    let svc = service(store.clone(), Arc::new(MockTextModel::new("")));

    let context = IngestContext {
        collection: "docs".to_string(),
        ..IngestContext::default()
    };
    let err = svc
        .embed_text(&"word ".repeat(600), &context)
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Store(_)));
    assert_eq!(store.upserts.lock().len(), 1);
}

#[tokio::test]
async fn empty_query_embedding_skips_the_store_entirely() {
    let store = Arc::new(RecordingStore::default());
    let svc = RagService::new(store.clone(), Arc::new(EmptyEmbedModel), "test-model");

    let results = svc
        .find_similar(
            "query",
            &SearchContext {
                collection: "docs".to_string(),
                ..SearchContext::default()
            },
        )
        .await
        .unwrap();

    assert!(results.is_empty());
    assert!(store.searches.lock().is_empty());
}

#[tokio::test]
async fn search_filters_and_limit_reach_the_store() {
    let store = Arc::new(RecordingStore::default());
    let svc = service(store.clone(), Arc::new(MockTextModel::new("")));

    svc.find_similar(
        "query",
        &SearchContext {
            collection: "docs".to_string(),
            tags: vec!["rust".to_string()],
            keys: vec!["k1".to_string()],
            kind: Some("article".to_string()),
            limit: Some(5),
        },
    )
    .await
    .unwrap();

    let searches = store.searches.lock();
    assert_eq!(searches.len(), 1);
    let (collection, query) = &searches[0];
    assert_eq!(collection, "docs");
    assert_eq!(query.limit, 5);
    assert_eq!(query.filter.must.len(), 3);
}

#[tokio::test]
async fn generation_with_context_wraps_retrieved_chunks() {
    let store = Arc::new(RecordingStore::with_results(vec![
        hit("first snippet", 0.9),
        hit("second snippet", 0.8),
    ]));
    let model = Arc::new(MockTextModel::new("answer"));
    let svc = service(store, model.clone());

    let completion = svc
        .generate_text(
            "the question",
            Some(&SearchContext {
                collection: "docs".to_string(),
                ..SearchContext::default()
            }),
            None,
        )
        .await
        .unwrap();

    assert_eq!(completion.text, "answer");
    let calls = model.complete_calls.lock();
    assert_eq!(
        calls[0].prompt,
        "Use this additional context for your response:\n\n------\n\n\
         first snippet\n\n------\n\nsecond snippet\n\n------\n\n\
         User input:\n\nthe question"
    );
    assert_eq!(calls[0].model, "test-model");
}

#[tokio::test]
async fn generation_without_context_sends_the_raw_text() {
    let model = Arc::new(MockTextModel::new("answer"));
    let svc = service(Arc::new(RecordingStore::default()), model.clone());

    svc.generate_text("just the text", None, None).await.unwrap();

    assert_eq!(model.complete_calls.lock()[0].prompt, "just the text");
}

#[tokio::test]
async fn malformed_format_schema_fails_before_any_completion() {
    let model = Arc::new(MockTextModel::new("answer"));
    let svc = service(Arc::new(RecordingStore::default()), model.clone());

    let err = svc
        .generate_text(
            "text",
            None,
            Some(&GenerationOptions {
                format: Some("{broken".to_string()),
                ..GenerationOptions::default()
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Configuration(_)));
    assert!(model.complete_calls.lock().is_empty());
}

#[tokio::test]
async fn delete_by_key_targets_the_key_field() {
    let store = Arc::new(RecordingStore::default());
    let svc = service(store.clone(), Arc::new(MockTextModel::new("")));

    svc.delete_by_key("docs", "doc-1").await.unwrap();

    let deleted = store.deleted_filters.lock();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].0, "docs");
    assert_eq!(
        serde_json::to_value(&deleted[0].1).unwrap(),
        json!({"must": [{"key": "key", "match": {"value": "doc-1"}}]})
    );
}

#[tokio::test]
async fn update_payload_merges_metadata_by_key() {
    let store = Arc::new(RecordingStore::default());
    let svc = service(store.clone(), Arc::new(MockTextModel::new("")));

    svc.update_payload("docs", "doc-1", json!({"title": "renamed"}))
        .await
        .unwrap();

    let updates = store.payload_updates.lock();
    assert_eq!(updates.len(), 1);
    let (collection, payload, filter) = &updates[0];
    assert_eq!(collection, "docs");
    assert_eq!(payload["title"], "renamed");
    assert_eq!(
        serde_json::to_value(filter).unwrap(),
        json!({"must": [{"key": "key", "match": {"value": "doc-1"}}]})
    );
}
