//! In-memory vector store with cosine scoring.
//!
//! Deterministic stand-in for a real store: useful in tests and for running
//! the orchestrator without any services. Enforces the one-dimensionality-
//! per-collection invariant that real stores enforce.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::RagError;

use super::{CollectionInfo, Filter, PointStruct, ScoredPoint, SearchQuery, VectorStore};

#[derive(Debug, Default)]
struct Collection {
    vector_size: usize,
    points: Vec<PointStruct>,
}

/// Thread-safe in-memory [`VectorStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points currently held in `collection`.
    pub fn point_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, RagError> {
        let collections = self.collections.read();
        Ok(collections
            .keys()
            .map(|name| CollectionInfo { name: name.clone() })
            .collect())
    }

    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<(), RagError> {
        let mut collections = self.collections.write();
        // Duplicate creation is tolerated; racing ingests serialize here.
        collections.entry(name.to_string()).or_insert(Collection {
            vector_size,
            points: Vec::new(),
        });
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<(), RagError> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::Store(format!("unknown collection '{collection}'")))?;
        for point in points {
            if point.vector.len() != target.vector_size {
                return Err(RagError::Store(format!(
                    "vector size {} does not match collection '{collection}' size {}",
                    point.vector.len(),
                    target.vector_size
                )));
            }
            target.points.retain(|existing| existing.id != point.id);
            target.points.push(point);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: SearchQuery,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let collections = self.collections.read();
        let target = collections
            .get(collection)
            .ok_or_else(|| RagError::Store(format!("unknown collection '{collection}'")))?;
        if query.vector.len() != target.vector_size {
            return Err(RagError::Store(format!(
                "query vector size {} does not match collection '{collection}' size {}",
                query.vector.len(),
                target.vector_size
            )));
        }

        let mut hits: Vec<ScoredPoint> = target
            .points
            .iter()
            .filter(|point| query.filter.matches(&point.payload))
            .map(|point| ScoredPoint {
                score: cosine_similarity(&query.vector, &point.vector),
                payload: point.payload.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), RagError> {
        self.collections.write().remove(name);
        Ok(())
    }

    async fn delete_points(&self, collection: &str, filter: &Filter) -> Result<(), RagError> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::Store(format!("unknown collection '{collection}'")))?;
        target.points.retain(|point| !filter.matches(&point.payload));
        Ok(())
    }

    async fn set_payload(
        &self,
        collection: &str,
        payload: serde_json::Value,
        filter: &Filter,
    ) -> Result<(), RagError> {
        let updates = payload
            .as_object()
            .ok_or_else(|| RagError::Store("payload update must be a JSON object".to_string()))?
            .clone();

        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::Store(format!("unknown collection '{collection}'")))?;
        for point in target
            .points
            .iter_mut()
            .filter(|point| filter.matches(&point.payload))
        {
            if let serde_json::Value::Object(existing) = &mut point.payload {
                for (key, value) in &updates {
                    existing.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::Condition;
    use serde_json::json;
    use uuid::Uuid;

    fn point(vector: Vec<f32>, payload: serde_json::Value) -> PointStruct {
        PointStruct {
            id: Uuid::new_v4(),
            vector,
            payload,
        }
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let store = MemoryStore::new();
        store.create_collection("docs", 2).await.unwrap();
        store
            .upsert(
                "docs",
                vec![
                    point(vec![1.0, 0.0], json!({"source": "east"})),
                    point(vec![0.0, 1.0], json!({"source": "north"})),
                    point(vec![0.7, 0.7], json!({"source": "diagonal"})),
                ],
            )
            .await
            .unwrap();

        let hits = store
            .search(
                "docs",
                SearchQuery {
                    vector: vec![1.0, 0.0],
                    limit: 2,
                    filter: Filter::default(),
                },
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload["source"], "east");
        assert_eq!(hits[1].payload["source"], "diagonal");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn search_applies_the_filter() {
        let store = MemoryStore::new();
        store.create_collection("docs", 1).await.unwrap();
        store
            .upsert(
                "docs",
                vec![
                    point(vec![1.0], json!({"type": "note", "tags": ["rust"]})),
                    point(vec![1.0], json!({"type": "task", "tags": ["rust"]})),
                ],
            )
            .await
            .unwrap();

        let hits = store
            .search(
                "docs",
                SearchQuery {
                    vector: vec![1.0],
                    limit: 10,
                    filter: Filter {
                        must: vec![Condition::value("type", "note")],
                    },
                },
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload["type"], "note");
    }

    #[tokio::test]
    async fn upsert_rejects_mismatched_dimensions() {
        let store = MemoryStore::new();
        store.create_collection("docs", 3).await.unwrap();
        let err = store
            .upsert("docs", vec![point(vec![1.0], json!({}))])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Store(_)));
    }

    #[tokio::test]
    async fn duplicate_create_is_tolerated() {
        let store = MemoryStore::new();
        store.create_collection("docs", 2).await.unwrap();
        store
            .upsert("docs", vec![point(vec![1.0, 0.0], json!({}))])
            .await
            .unwrap();
        // Second create keeps the existing points.
        store.create_collection("docs", 2).await.unwrap();
        assert_eq!(store.point_count("docs"), 1);
    }

    #[tokio::test]
    async fn delete_points_honors_the_filter() {
        let store = MemoryStore::new();
        store.create_collection("docs", 1).await.unwrap();
        store
            .upsert(
                "docs",
                vec![
                    point(vec![1.0], json!({"key": "a"})),
                    point(vec![1.0], json!({"key": "b"})),
                ],
            )
            .await
            .unwrap();

        store
            .delete_points(
                "docs",
                &Filter {
                    must: vec![Condition::value("key", "a")],
                },
            )
            .await
            .unwrap();
        assert_eq!(store.point_count("docs"), 1);
    }

    #[tokio::test]
    async fn set_payload_merges_into_matches() {
        let store = MemoryStore::new();
        store.create_collection("docs", 1).await.unwrap();
        store
            .upsert(
                "docs",
                vec![point(vec![1.0], json!({"key": "a", "title": "old"}))],
            )
            .await
            .unwrap();

        store
            .set_payload(
                "docs",
                json!({"title": "new", "extra": true}),
                &Filter {
                    must: vec![Condition::value("key", "a")],
                },
            )
            .await
            .unwrap();

        let hits = store
            .search(
                "docs",
                SearchQuery {
                    vector: vec![1.0],
                    limit: 1,
                    filter: Filter::default(),
                },
            )
            .await
            .unwrap();
        assert_eq!(hits[0].payload["title"], "new");
        assert_eq!(hits[0].payload["extra"], true);
        assert_eq!(hits[0].payload["key"], "a");
    }
}
