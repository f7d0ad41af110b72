//! Retrieval and prompt assembly
//!
//! `ask` embeds the question, searches the store, and builds the system
//! prompt sent to the chat model. When the index is empty, the embedder is
//! down, or the question cannot be embedded, degraded prompts built from the
//! file list alone keep the assistant answering.

use crate::config::RetrievalConfig;
use crate::error::{RagError, ValidationError};
use crate::ollama::ModelClient;
use crate::store::VectorStore;
use crate::types::SearchResult;
use std::sync::Arc;

const EMBEDDER_DOWN_CAVEAT: &str = "The embedding service is currently unavailable, so file \
contents cannot be searched. Only the file paths listed below are known; say so when the \
answer would require looking inside files.";

const EMBED_FAILED_CAVEAT: &str = "The question could not be converted into an embedding, so \
file contents cannot be searched for this request. Only the file paths listed below are known; \
say so when the answer would require looking inside files.";

#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    model: Arc<dyn ModelClient>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        model: Arc<dyn ModelClient>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            model,
            config,
        }
    }

    /// Answer a question about the indexed codebase.
    ///
    /// An empty question is rejected before any state is touched. All other
    /// failures degrade: the chat model is always consulted, with a system
    /// prompt matching how much of the pipeline is available.
    pub async fn ask(&self, question: &str) -> Result<String, RagError> {
        if question.trim().is_empty() {
            return Err(ValidationError::Empty("question".to_string()).into());
        }

        let files = self.store.all_files().await;
        let healthy = self.model.is_healthy().await;

        if files.is_empty() {
            tracing::debug!("Index is empty, answering from the empty-index prompt");
            let system_prompt = empty_index_prompt();
            return Ok(self.model.chat(question, &system_prompt).await);
        }

        if !healthy {
            tracing::warn!("Embedding service unhealthy, answering from file list only");
            let system_prompt = self.file_list_prompt(&files, EMBEDDER_DOWN_CAVEAT);
            return Ok(self.model.chat(question, &system_prompt).await);
        }

        let query_vector = self.model.embed(question).await;
        if query_vector.iter().all(|v| *v == 0.0) {
            tracing::warn!("Question embedding fell back to zero vector");
            let system_prompt = self.file_list_prompt(&files, EMBED_FAILED_CAVEAT);
            return Ok(self.model.chat(question, &system_prompt).await);
        }

        let results = self
            .store
            .search(&query_vector, self.config.top_k)
            .await
            .map_err(RagError::from)?;

        let system_prompt = self.context_prompt(&files, &results);
        Ok(self.model.chat(question, &system_prompt).await)
    }

    /// Any result strictly above the similarity threshold counts
    fn has_meaningful_results(&self, results: &[SearchResult]) -> bool {
        results
            .iter()
            .any(|r| r.similarity > self.config.similarity_threshold)
    }

    fn file_list_prompt(&self, files: &[String], caveat: &str) -> String {
        let limit = self.config.degraded_file_list_limit;
        let mut prompt = String::from("You are a code assistant for a source repository.\n");
        prompt.push_str(caveat);
        prompt.push_str(&format!(
            "\n\nThe index contains {} files. Known file paths:\n",
            files.len()
        ));
        for file in files.iter().take(limit) {
            prompt.push_str(&format!("- {}\n", file));
        }
        if files.len() > limit {
            prompt.push_str(&format!("... and {} more files\n", files.len() - limit));
        }
        prompt
    }

    fn context_prompt(&self, files: &[String], results: &[SearchResult]) -> String {
        let limit = self.config.prompt_file_list_limit;
        let mut prompt = format!(
            "You are a code assistant for a source repository with {} indexed files.\n\nFiles:\n",
            files.len()
        );
        for file in files.iter().take(limit) {
            prompt.push_str(&format!("- {}\n", file));
        }
        if files.len() > limit {
            prompt.push_str(&format!("... and {} more files\n", files.len() - limit));
        }

        if self.has_meaningful_results(results) {
            prompt.push_str("\nRelevant code snippets:\n");
            for (index, result) in results.iter().enumerate() {
                prompt.push_str(&format!(
                    "\n[{}] {} (lines {}-{}, similarity {:.3})\n{}\n",
                    index + 1,
                    result.chunk.file_name,
                    result.chunk.start_line,
                    result.chunk.end_line,
                    result.similarity,
                    result.chunk.content
                ));
            }
        } else {
            prompt.push_str(
                "\nNo relevant code snippets were found for this question. Answer from the \
file list above and say that nothing matched.\n",
            );
        }
        prompt
    }
}

fn empty_index_prompt() -> String {
    "You are a code assistant for a source repository. The codebase index is empty: no files \
have been indexed yet. Tell the user that nothing is indexed and suggest running an indexing \
pass over their repository root before asking questions about the code."
        .to_string()
}
