//! Indexing coordinator
//!
//! Owns the single long-running indexing job: scans the tree through the
//! archetype-specific crawler, decides skip vs. re-index per file by mtime,
//! embeds the collected chunks in batches, and writes them to the store.
//! Progress is observable through a status snapshot; cancellation is
//! cooperative and idempotent. The job never returns an error to its
//! spawner; every failure surfaces through the status message.

use crate::config::IndexingConfig;
use crate::crawler::{crawler_for, file_mtime_utc, Crawler};
use crate::detector::detect_project_type;
use crate::ollama::ModelClient;
use crate::store::VectorStore;
use crate::types::{Chunk, IndexingStatus, ProjectType};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    model: Arc<dyn ModelClient>,
    config: IndexingConfig,
    status: Arc<RwLock<IndexingStatus>>,
    /// Cancellation token of the active job, `None` while idle
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn VectorStore>,
        model: Arc<dyn ModelClient>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            store,
            model,
            config,
            status: Arc::new(RwLock::new(IndexingStatus::default())),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Snapshot of the current indexing status
    pub fn status(&self) -> IndexingStatus {
        self.status.read().unwrap().clone()
    }

    pub fn is_indexing(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    /// Start an indexing job for `root`.
    ///
    /// Returns immediately; the job runs on a background task. A second call
    /// while a job is active is ignored with a warning.
    pub fn start(&self, root: impl Into<String>, exclude_patterns: Vec<String>) {
        let token = {
            let mut active = self.active.lock().unwrap();
            if active.is_some() {
                tracing::warn!("Indexing already in progress, ignoring start request");
                return;
            }
            let token = CancellationToken::new();
            *active = Some(token.clone());
            token
        };

        self.set_status(|status| {
            *status = IndexingStatus {
                is_indexing: true,
                message: "Scanning files...".to_string(),
                ..Default::default()
            };
        });

        let indexer = self.clone();
        let root = root.into();
        tokio::spawn(async move {
            indexer.run_job(root, exclude_patterns, token).await;
            *indexer.active.lock().unwrap() = None;
        });
    }

    /// Request cancellation of the active job. No-op while idle; safe to
    /// call repeatedly.
    pub fn cancel(&self) {
        let active = self.active.lock().unwrap();
        match active.as_ref() {
            Some(token) => {
                tracing::info!("Cancellation requested");
                token.cancel();
            }
            None => tracing::debug!("Cancel requested while idle, nothing to do"),
        }
    }

    fn set_status(&self, update: impl FnOnce(&mut IndexingStatus)) {
        update(&mut self.status.write().unwrap());
    }

    fn bump_processed(&self) {
        self.set_status(|status| status.processed_files += 1);
    }

    fn finish(&self, message: String) {
        tracing::info!("{}", message);
        self.set_status(|status| {
            status.is_indexing = false;
            status.current_file = None;
            status.message = message;
        });
    }

    async fn run_job(&self, root: String, exclude_patterns: Vec<String>, cancel: CancellationToken) {
        // Roots pasted from shells often arrive quoted
        let root = root.trim().trim_matches('"').trim_matches('\'').to_string();
        let root_path = PathBuf::from(&root);

        if !root_path.is_dir() {
            self.finish(format!("Indexing failed: directory not found: {}", root));
            return;
        }

        let project_type = {
            let path = root_path.clone();
            tokio::task::spawn_blocking(move || detect_project_type(&path))
                .await
                .unwrap_or(ProjectType::Unknown)
        };
        tracing::info!("Indexing {:?} as {} project", root_path, project_type);

        let crawler = crawler_for(project_type, &self.config);

        let files = {
            let crawler = crawler.clone();
            let path = root_path.clone();
            let patterns = exclude_patterns.clone();
            match tokio::task::spawn_blocking(move || crawler.scan(&path, &patterns)).await {
                Ok(Ok(files)) => files,
                Ok(Err(e)) => {
                    self.finish(format!("Indexing failed: {:#}", e));
                    return;
                }
                Err(e) => {
                    self.finish(format!("Indexing failed: scan task panicked: {}", e));
                    return;
                }
            }
        };

        let total_files = files.len();
        self.set_status(|status| {
            status.total_files = total_files;
            status.message = format!("Processing {} files...", total_files);
        });

        let collector: Arc<Mutex<Vec<Chunk>>> = Arc::new(Mutex::new(Vec::new()));
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallelism));
        let mut tasks = JoinSet::new();

        for path in files {
            // Cancellation stops scheduling; in-flight tasks run to completion
            if cancel.is_cancelled() {
                tracing::info!("Cancellation observed, no further files scheduled");
                break;
            }
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let indexer = self.clone();
            let crawler = crawler.clone();
            let collector = collector.clone();
            tasks.spawn(async move {
                indexer.process_file(crawler.as_ref(), &path, &collector).await;
                drop(permit);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("File task failed: {}", e);
            }
        }

        let chunks = {
            let mut guard = collector.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        let total_chunks = chunks.len();
        let mut embedded = 0usize;
        let mut cancelled = cancel.is_cancelled();

        for batch in chunks.chunks(self.config.embedding_batch_size) {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            self.set_status(|status| {
                status.message =
                    format!("Embedding chunks... {}/{}", embedded, total_chunks);
            });

            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.model.embed_batch(&texts).await;

            // Embeddings are assigned before the upsert, so readers never
            // observe a stored chunk without its vector.
            let ready: Vec<Chunk> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(mut chunk, vector)| {
                    chunk.embedding = Some(vector);
                    chunk
                })
                .collect();

            if let Err(e) = self.store.upsert(ready).await {
                tracing::warn!("Failed to store embedding batch: {:#}, skipping", e);
                continue;
            }
            embedded += batch.len();
        }

        let processed = self.status.read().unwrap().processed_files;
        let message = if cancelled {
            format!(
                "Indexing cancelled. Processed {} of {} files, stored {} chunks.",
                processed, total_files, embedded
            )
        } else {
            format!(
                "Indexing complete. Processed {} files, stored {} chunks.",
                processed, embedded
            )
        };
        self.finish(message);
    }

    async fn process_file(
        &self,
        crawler: &dyn Crawler,
        path: &Path,
        collector: &Mutex<Vec<Chunk>>,
    ) {
        let path_str = path.to_string_lossy().to_string();
        self.set_status(|status| status.current_file = Some(path_str.clone()));

        let mtime = match tokio::fs::metadata(path).await {
            Ok(metadata) => file_mtime_utc(&metadata),
            Err(e) => {
                tracing::warn!("Failed to stat {:?}: {}", path, e);
                self.bump_processed();
                return;
            }
        };

        if let Some(stored) = self.store.last_modified(&path_str).await {
            // Equal mtime means already indexed; only strictly newer files
            // are re-indexed.
            if stored >= mtime {
                tracing::debug!("Skipping unchanged file {:?}", path);
                self.bump_processed();
                return;
            }
            // Stale chunks must be gone before the fresh ones arrive
            self.store.delete_file_chunks(&path_str).await;
        }

        let chunks = crawler.process(path).await;
        if !chunks.is_empty() {
            collector.lock().unwrap().extend(chunks);
        }
        self.bump_processed();
    }
}
