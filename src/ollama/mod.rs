//! Remote model server access
//!
//! The rest of the pipeline talks to the model server through the
//! [`ModelClient`] capability trait, so tests and alternative backends can
//! swap the transport. The concrete [`OllamaClient`] fronts an
//! Ollama-compatible HTTP API.

mod client;

pub use client::OllamaClient;

use async_trait::async_trait;

/// Capability bundle over the remote embedding/chat models.
///
/// All methods are total: transport failures surface as documented fallback
/// values (zero vector, apology string), never as errors. Failures flip the
/// cached health state to unhealthy.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Embed one text. On failure returns the zero vector of the configured
    /// fallback dimension.
    async fn embed(&self, text: &str) -> Vec<f32>;

    /// Embed a batch, one vector per input in order. A failed item yields a
    /// zero vector without aborting the rest.
    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>>;

    /// Chat completion. On failure returns a fixed apology string.
    async fn chat(&self, user_prompt: &str, system_prompt: &str) -> String;

    /// Liveness of the model server, cached while healthy.
    async fn is_healthy(&self) -> bool;
}
