//! HTTP client for an Ollama-compatible model server
//!
//! Endpoints: `POST /api/embed`, `POST /api/chat`, `GET /api/tags` (liveness
//! probe). Transient failures (timeout, connect, 5xx) are retried with
//! exponential backoff; on exhaustion the documented fallbacks apply and the
//! health cache flips to unhealthy.

use crate::config::OllamaConfig;
use crate::error::EmbeddingError;
use crate::ollama::ModelClient;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Reply sent to the user when the chat model cannot be reached
const CHAT_FAILURE_MESSAGE: &str = "I'm sorry, I could not reach the language model. \
Please check that the model server is running and try again.";

/// Reply sent to the user when the chat model returns nothing
const EMPTY_RESPONSE_MESSAGE: &str =
    "The model returned an empty response. Please try rephrasing your question.";

#[derive(Debug, Clone, Copy)]
struct HealthState {
    healthy: bool,
    checked_at: Option<Instant>,
}

pub struct OllamaClient {
    config: OllamaConfig,
    http: Client,
    health: RwLock<HealthState>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, EmbeddingError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_minutes * 60))
            .build()
            .map_err(|e| {
                EmbeddingError::RequestFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            http,
            health: RwLock::new(HealthState {
                healthy: false,
                checked_at: None,
            }),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{}", self.config.base_url.trim_end_matches('/'), name)
    }

    fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.config.fallback_embedding_dimension]
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.config.retry_delay_base_seconds.pow(attempt))
    }

    fn mark_unhealthy(&self) {
        *self.health.write().unwrap() = HealthState {
            healthy: false,
            checked_at: Some(Instant::now()),
        };
    }

    /// POST a JSON body, retrying transient failures with exponential backoff.
    ///
    /// 5xx, timeouts, and connection errors are retried up to `max_retries`
    /// attempts; 4xx is permanent and returns immediately.
    async fn post_with_retry(
        &self,
        name: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, EmbeddingError> {
        let url = self.endpoint(name);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.http.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status().is_server_error() => {
                    let status = response.status().as_u16();
                    if attempt >= self.config.max_retries {
                        let body = response.text().await.unwrap_or_default();
                        return Err(EmbeddingError::ServerError { status, body });
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        "Model server returned {} for /api/{}, retrying in {:?} ({}/{})",
                        status,
                        name,
                        delay,
                        attempt,
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(EmbeddingError::ServerError { status, body });
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if attempt >= self.config.max_retries {
                        return if e.is_timeout() {
                            Err(EmbeddingError::Timeout(
                                self.config.request_timeout_minutes * 60,
                            ))
                        } else {
                            Err(EmbeddingError::RequestFailed(e.to_string()))
                        };
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        "Request to /api/{} failed ({}), retrying in {:?} ({}/{})",
                        name,
                        e,
                        delay,
                        attempt,
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(EmbeddingError::RequestFailed(e.to_string())),
            }
        }
    }

    async fn try_embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = json!({
            "model": self.config.embedding_model,
            "input": text,
        });

        let response = self.post_with_retry("embed", body).await?;
        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::EmptyEmbedding);
        }
        Ok(parsed.embedding)
    }

    async fn try_chat(
        &self,
        user_prompt: &str,
        system_prompt: &str,
    ) -> Result<String, EmbeddingError> {
        let body = json!({
            "model": self.config.chat_model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "stream": false,
        });

        let response = self.post_with_retry("chat", body).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(parsed.message.map(|m| m.content).unwrap_or_default())
    }

    async fn probe_health(&self) -> bool {
        let url = self.endpoint("tags");
        let probe = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(self.config.health_probe_timeout_seconds))
            .send()
            .await;

        match probe {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Health probe failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn embed(&self, text: &str) -> Vec<f32> {
        match self.try_embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!("Embedding failed, substituting zero vector: {}", e);
                self.mark_unhealthy();
                self.zero_vector()
            }
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await);
        }
        vectors
    }

    async fn chat(&self, user_prompt: &str, system_prompt: &str) -> String {
        match self.try_chat(user_prompt, system_prompt).await {
            Ok(content) if content.trim().is_empty() => EMPTY_RESPONSE_MESSAGE.to_string(),
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                self.mark_unhealthy();
                CHAT_FAILURE_MESSAGE.to_string()
            }
        }
    }

    async fn is_healthy(&self) -> bool {
        {
            let state = self.health.read().unwrap();
            if state.healthy
                && state.checked_at.is_some_and(|t| {
                    t.elapsed() < Duration::from_secs(self.config.health_cache_seconds)
                })
            {
                return true;
            }
        }

        let healthy = self.probe_health().await;
        *self.health.write().unwrap() = HealthState {
            healthy,
            checked_at: Some(Instant::now()),
        };
        healthy
    }
}
