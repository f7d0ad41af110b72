//! In-memory [`VectorStore`] implementation
//!
//! A `Vec` of chunks behind `std::sync::RwLock`: one writer at a time,
//! readers always observe a consistent snapshot. Search is brute-force
//! cosine similarity over every embedded chunk.

use super::{cosine_similarity, VectorStore};
use crate::types::{Chunk, SearchResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// Reference vector store; the whole index lives in process memory.
#[derive(Default)]
pub struct InMemoryVectorStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, incoming: Vec<Chunk>) -> Result<()> {
        let mut chunks = self.chunks.write().unwrap();
        for chunk in incoming {
            match chunks.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk,
                None => chunks.push(chunk),
            }
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let chunks = self.chunks.read().unwrap();
        let mut results: Vec<SearchResult> = chunks
            .iter()
            .filter(|c| c.embedding.is_some())
            .map(|c| SearchResult {
                similarity: cosine_similarity(query, c.embedding.as_deref().unwrap_or(&[])),
                chunk: c.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);
        Ok(results)
    }

    async fn count(&self) -> usize {
        self.chunks.read().unwrap().len()
    }

    async fn clear(&self) {
        self.chunks.write().unwrap().clear();
    }

    async fn all_files(&self) -> Vec<String> {
        let chunks = self.chunks.read().unwrap();
        let mut files = Vec::new();
        for chunk in chunks.iter() {
            if !files.contains(&chunk.file_path) {
                files.push(chunk.file_path.clone());
            }
        }
        files
    }

    async fn last_modified(&self, file_path: &str) -> Option<DateTime<Utc>> {
        let chunks = self.chunks.read().unwrap();
        chunks
            .iter()
            .find(|c| c.file_path == file_path)
            .map(|c| c.last_modified)
    }

    async fn delete_file_chunks(&self, file_path: &str) -> usize {
        let mut chunks = self.chunks.write().unwrap();
        let before = chunks.len();
        chunks.retain(|c| c.file_path != file_path);
        before - chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceFile;
    use std::path::Path;

    fn chunk(path: &str, content: &str, embedding: Option<Vec<f32>>) -> Chunk {
        let file = SourceFile::new(Path::new(path), content.to_string(), Utc::now());
        let mut c = Chunk::new(&file, content.to_string(), 1, 1, "text");
        c.embedding = embedding;
        c
    }

    #[tokio::test]
    async fn test_upsert_and_count() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![chunk("/a.txt", "one", None), chunk("/b.txt", "two", None)])
            .await
            .unwrap();
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = InMemoryVectorStore::new();
        let mut c = chunk("/a.txt", "old", None);
        store.upsert(vec![c.clone()]).await.unwrap();

        c.content = "new".to_string();
        c.embedding = Some(vec![1.0, 0.0]);
        store.upsert(vec![c.clone()]).await.unwrap();

        assert_eq!(store.count().await, 1);
        let results = store.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "new");
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity_and_truncates() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                chunk("/a.txt", "exact", Some(vec![1.0, 0.0])),
                chunk("/b.txt", "close", Some(vec![0.9, 0.1])),
                chunk("/c.txt", "far", Some(vec![0.0, 1.0])),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "exact");
        assert_eq!(results[1].chunk.content, "close");
        assert!(results[0].similarity > results[1].similarity);
    }

    #[tokio::test]
    async fn test_search_skips_unembedded_chunks() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                chunk("/a.txt", "embedded", Some(vec![1.0, 0.0])),
                chunk("/b.txt", "pending", None),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "embedded");
    }

    #[tokio::test]
    async fn test_search_with_zero_query_returns_zero_similarities() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![chunk("/a.txt", "x", Some(vec![1.0, 0.0]))])
            .await
            .unwrap();

        let results = store.search(&[0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity, 0.0);
    }

    #[tokio::test]
    async fn test_all_files_distinct_in_first_seen_order() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                chunk("/a.txt", "1", None),
                chunk("/b.txt", "2", None),
                chunk("/a.txt", "3", None),
            ])
            .await
            .unwrap();

        assert_eq!(store.all_files().await, vec!["/a.txt", "/b.txt"]);
    }

    #[tokio::test]
    async fn test_last_modified_lookup() {
        let store = InMemoryVectorStore::new();
        let c = chunk("/a.txt", "1", None);
        let stamp = c.last_modified;
        store.upsert(vec![c]).await.unwrap();

        assert_eq!(store.last_modified("/a.txt").await, Some(stamp));
        assert_eq!(store.last_modified("/missing.txt").await, None);
    }

    #[tokio::test]
    async fn test_delete_file_chunks() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                chunk("/a.txt", "1", None),
                chunk("/a.txt", "2", None),
                chunk("/b.txt", "3", None),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_file_chunks("/a.txt").await, 2);
        assert_eq!(store.count().await, 1);
        assert_eq!(store.all_files().await, vec!["/b.txt"]);
        assert_eq!(store.delete_file_chunks("/a.txt").await, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryVectorStore::new();
        store.upsert(vec![chunk("/a.txt", "1", None)]).await.unwrap();
        store.clear().await;
        assert_eq!(store.count().await, 0);
        assert!(store.all_files().await.is_empty());
    }
}
