//! Thin HTTP surface over the core
//!
//! Handlers adapt JSON to core calls and map [`RagError`] onto status codes;
//! no pipeline logic lives here.

use crate::config::IndexingConfig;
use crate::crawler::crawler_for;
use crate::detector::detect_project_type;
use crate::indexer::Indexer;
use crate::retriever::Retriever;
use crate::types::IndexingStatus;
use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub indexer: Indexer,
    pub retriever: Retriever,
    pub indexing_config: IndexingConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildRequest {
    pub root_path: String,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    pub root: String,
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEntry {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
}

type HandlerError = (StatusCode, String);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/indexing/rebuild", post(rebuild))
        .route("/indexing/cancel", post(cancel_indexing))
        .route("/indexing/status", get(indexing_status))
        .route("/indexing/files", get(indexing_files))
        .route("/indexing/browse", get(browse))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the HTTP surface until the process exits
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn rebuild(
    State(state): State<AppState>,
    Json(request): Json<RebuildRequest>,
) -> Result<StatusCode, HandlerError> {
    if request.root_path.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "rootPath must not be empty".to_string(),
        ));
    }
    state
        .indexer
        .start(request.root_path, request.exclude_patterns);
    Ok(StatusCode::ACCEPTED)
}

async fn cancel_indexing(State(state): State<AppState>) -> StatusCode {
    state.indexer.cancel();
    StatusCode::OK
}

async fn indexing_status(State(state): State<AppState>) -> Json<IndexingStatus> {
    Json(state.indexer.status())
}

/// List the files an indexing run over `root` would consider
async fn indexing_files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<Vec<String>>, HandlerError> {
    let root = PathBuf::from(query.root.trim());
    let config = state.indexing_config.clone();

    let files = tokio::task::spawn_blocking(move || {
        let project_type = detect_project_type(&root);
        let crawler = crawler_for(project_type, &config);
        crawler.scan(&root, &[])
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("scan task failed: {}", e),
        )
    })?
    .map_err(|e| (StatusCode::BAD_REQUEST, format!("{:#}", e)))?;

    Ok(Json(
        files
            .into_iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect(),
    ))
}

async fn browse(Query(query): Query<BrowseQuery>) -> Result<Json<Vec<BrowseEntry>>, HandlerError> {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    let entries = list_directory(Path::new(&path))
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(entries))
}

fn list_directory(path: &Path) -> std::io::Result<Vec<BrowseEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();
        entries.push(BrowseEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            path: entry_path.to_string_lossy().to_string(),
            is_directory: entry_path.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, HandlerError> {
    match state.retriever.ask(&request.message).await {
        Ok(answer) => Ok(Json(ChatResponse { answer })),
        Err(e) if e.is_user_error() => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            tracing::error!("Chat request failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
