//! Vector store abstraction
//!
//! Holds chunks with their embeddings and serves brute-force cosine top-k
//! search. The in-memory implementation is the reference store; a durable
//! backend would implement the same trait.

mod memory;

pub use memory::InMemoryVectorStore;

use crate::types::{Chunk, SearchResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for vector store operations
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks, replacing any existing chunk with the same id
    async fn upsert(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// Top-`limit` chunks by cosine similarity to `query`, descending.
    /// Chunks without an embedding are not searched.
    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Number of chunks currently stored
    async fn count(&self) -> usize;

    /// Remove everything
    async fn clear(&self);

    /// Distinct file paths with at least one chunk, in first-seen order
    async fn all_files(&self) -> Vec<String>;

    /// `last_modified` of the first chunk found for `file_path`
    async fn last_modified(&self, file_path: &str) -> Option<DateTime<Utc>>;

    /// Delete every chunk belonging to `file_path`; returns how many
    async fn delete_file_chunks(&self, file_path: &str) -> usize;
}

/// Cosine similarity: `dot(a,b) / (|a|·|b|)`.
///
/// Mismatched lengths or a zero norm yield 0.0 rather than an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
