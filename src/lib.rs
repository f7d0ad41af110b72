//! # Repo RAG - Retrieval-Augmented Generation over source repositories
//!
//! Point the service at a root directory and it recursively scans the tree,
//! splits each file into semantically meaningful chunks, embeds every chunk
//! through an Ollama-compatible model server, and keeps the (chunk,
//! embedding) pairs in a vector store. Questions are answered by embedding
//! the query, retrieving the most similar chunks by cosine similarity, and
//! handing the assembled context to the chat model.
//!
//! ## Architecture
//!
//! - **Detector**: classifies the root into a project archetype from marker
//!   files, which selects the crawler variant.
//! - **Crawler**: enumerates indexable files and dispatches each to the
//!   chunker matching its extension (tree-sitter for C#, statement-aware
//!   splitting for SQL, size-bounded line chunking otherwise).
//! - **Indexer**: the single long-running coordinator; processes files in
//!   parallel with per-file incrementality, embeds in batches, and exposes
//!   live status plus cooperative cancellation.
//! - **Vector store**: in-memory reference implementation with brute-force
//!   cosine top-k search behind the [`store::VectorStore`] trait.
//! - **Retriever**: assembles the context prompt, with degraded branches
//!   when the index is empty or the embedder is unreachable.
//! - **HTTP surface**: a thin axum router adapting JSON to core calls.
//!
//! ## Library usage example
//!
//! ```no_run
//! use repo_rag::config::Config;
//! use repo_rag::indexer::Indexer;
//! use repo_rag::ollama::OllamaClient;
//! use repo_rag::retriever::Retriever;
//! use repo_rag::store::InMemoryVectorStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let model = Arc::new(OllamaClient::new(config.ollama.clone())?);
//!     let store = Arc::new(InMemoryVectorStore::new());
//!
//!     let indexer = Indexer::new(store.clone(), model.clone(), config.indexing.clone());
//!     indexer.start("/path/to/repo", vec![]);
//!
//!     let retriever = Retriever::new(store, model, config.retrieval.clone());
//!     let answer = retriever.ask("where is authentication handled?").await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```

/// Chunking strategies (C# syntax tree, SQL statements, generic lines)
pub mod chunking;

/// Configuration management with environment variable overrides
pub mod config;

/// File enumeration and chunker dispatch
pub mod crawler;

/// Project archetype detection from marker files
pub mod detector;

/// Error types and utilities
pub mod error;

/// The indexing coordinator: scan, incremental skip, batch embed, store
pub mod indexer;

/// Remote model server client (embed, chat, health)
pub mod ollama;

/// Retrieval and prompt assembly
pub mod retriever;

/// Thin HTTP surface over the core
pub mod server;

/// Vector store trait and the in-memory reference implementation
pub mod store;

/// Core data types
pub mod types;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::RagError;
pub use indexer::Indexer;
pub use ollama::{ModelClient, OllamaClient};
pub use retriever::Retriever;
pub use store::{InMemoryVectorStore, VectorStore};
pub use types::{Chunk, IndexingStatus, ProjectType, SearchResult};
