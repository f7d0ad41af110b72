//! File crawling: enumerating indexable files and dispatching to chunkers
//!
//! The crawler owns the filesystem boundary. `scan` walks a root and applies
//! binary/exclusion filters; `process` reads one file and hands it to the
//! chunker matching its extension. A factory returns the crawler variant for
//! the detected project archetype.

use crate::chunking::{CSharpChunker, LineChunker, SqlChunker};
use crate::config::IndexingConfig;
use crate::types::{Chunk, ProjectType, SourceFile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions that are never indexed
pub const BINARY_EXTENSIONS: &[&str] = &[
    "dll", "pdb", "bin", "png", "jpg", "jpeg", "gif", "ico", "zip", "7z", "tar", "gz", "pdf",
    "doc", "docx", "xls", "xlsx",
];

/// Directory names excluded regardless of user patterns
const IMPLICIT_EXCLUDED_DIRS: &[&str] = &["bin", "obj", ".git", "node_modules"];

/// Extensions handled by the SQL crawler
const SQL_EXTENSIONS: &[&str] = &["sql", "ddl", "dml"];

#[async_trait]
pub trait Crawler: Send + Sync {
    /// Enumerate indexable files under `root`, in a stable order
    fn scan(&self, root: &Path, exclude_patterns: &[String]) -> Result<Vec<PathBuf>>;

    /// Read one file and chunk it. Errors are logged and yield zero chunks.
    async fn process(&self, path: &Path) -> Vec<Chunk>;
}

/// Return the crawler for a detected project archetype.
///
/// Database trees get the SQL-only crawler; every other archetype shares the
/// generic crawler.
pub fn crawler_for(project_type: ProjectType, config: &IndexingConfig) -> Arc<dyn Crawler> {
    match project_type {
        ProjectType::SqlDatabase => Arc::new(SqlCrawler::new(config)),
        _ => Arc::new(GenericCrawler::new(config)),
    }
}

/// Crawler used for all non-database archetypes
pub struct GenericCrawler {
    max_file_size: u64,
    chunk_size: usize,
    sql_chunk_size: usize,
}

impl GenericCrawler {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            chunk_size: config.chunk_size,
            sql_chunk_size: config.sql_chunk_size,
        }
    }
}

#[async_trait]
impl Crawler for GenericCrawler {
    fn scan(&self, root: &Path, exclude_patterns: &[String]) -> Result<Vec<PathBuf>> {
        walk_files(root, exclude_patterns, |_| true)
    }

    async fn process(&self, path: &Path) -> Vec<Chunk> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if extension == "exe" {
            return executable_metadata_chunk(path).await.into_iter().collect();
        }

        let Some(file) = read_source(path, self.max_file_size).await else {
            return Vec::new();
        };

        if extension == "cs" {
            match CSharpChunker::new().chunk_file(&file) {
                Ok(chunks) => return chunks,
                Err(e) => {
                    tracing::debug!(
                        "C# parse failed for {:?}, falling back to line chunking: {}",
                        path,
                        e
                    );
                }
            }
        }

        if SQL_EXTENSIONS.contains(&extension.as_str()) {
            return SqlChunker::new(self.sql_chunk_size).chunk_file(&file);
        }

        LineChunker::new(self.chunk_size).chunk_file(&file)
    }
}

/// Crawler for database trees: only SQL files, always the SQL chunker
pub struct SqlCrawler {
    max_file_size: u64,
    sql_chunk_size: usize,
}

impl SqlCrawler {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            sql_chunk_size: config.sql_chunk_size,
        }
    }
}

#[async_trait]
impl Crawler for SqlCrawler {
    fn scan(&self, root: &Path, exclude_patterns: &[String]) -> Result<Vec<PathBuf>> {
        walk_files(root, exclude_patterns, |path| {
            path.extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .is_some_and(|ext| SQL_EXTENSIONS.contains(&ext.as_str()))
        })
    }

    async fn process(&self, path: &Path) -> Vec<Chunk> {
        let Some(file) = read_source(path, self.max_file_size).await else {
            return Vec::new();
        };
        SqlChunker::new(self.sql_chunk_size).chunk_file(&file)
    }
}

fn walk_files(
    root: &Path,
    exclude_patterns: &[String],
    accept: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        anyhow::bail!("Root directory does not exist: {:?}", root);
    }
    if !root.is_dir() {
        anyhow::bail!("Root path is not a directory: {:?}", root);
    }

    let lowered_patterns: Vec<String> = exclude_patterns
        .iter()
        .map(|p| p.to_lowercase())
        .collect();

    let mut files = Vec::new();

    let walker = WalkBuilder::new(root)
        .standard_filters(true)
        .hidden(false)
        .require_git(false)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if path.is_dir() {
            continue;
        }

        if has_excluded_component(path) {
            continue;
        }

        if let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase())
            && BINARY_EXTENSIONS.contains(&ext.as_str())
        {
            tracing::debug!("Skipping binary file: {:?}", path);
            continue;
        }

        if matches_exclude_pattern(path, &lowered_patterns) {
            continue;
        }

        if !accept(path) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    tracing::info!("Found {} files under {:?}", files.len(), root);
    Ok(files)
}

fn has_excluded_component(path: &Path) -> bool {
    path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy().to_lowercase();
        IMPLICIT_EXCLUDED_DIRS.contains(&name.as_str())
    })
}

/// Exclude patterns match by case-insensitive substring on the full path
fn matches_exclude_pattern(path: &Path, lowered_patterns: &[String]) -> bool {
    if lowered_patterns.is_empty() {
        return false;
    }
    let path_str = path.to_string_lossy().to_lowercase();
    lowered_patterns.iter().any(|p| path_str.contains(p))
}

/// Read a file into a [`SourceFile`], or `None` if it is oversized, empty,
/// unreadable, or not UTF-8. Failures are logged and never propagate.
async fn read_source(path: &Path, max_file_size: u64) -> Option<SourceFile> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Failed to stat {:?}: {}", path, e);
            return None;
        }
    };

    if metadata.len() > max_file_size {
        tracing::warn!(
            "Skipping oversized file {:?} ({} > {} bytes)",
            path,
            metadata.len(),
            max_file_size
        );
        return None;
    }

    let last_modified = file_mtime_utc(&metadata);

    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}", path, e);
            return None;
        }
    };

    if content.trim().is_empty() {
        return None;
    }

    Some(SourceFile::new(path, content, last_modified))
}

/// Synthetic metadata chunk for an executable; no content is read
async fn executable_metadata_chunk(path: &Path) -> Option<Chunk> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Failed to stat executable {:?}: {}", path, e);
            return None;
        }
    };

    let mtime = file_mtime_utc(&metadata);
    let file = SourceFile::new(path, String::new(), mtime);
    let content = format!(
        "Executable file: {}\nPath: {}\nSize: {} bytes\nLast modified: {}",
        file.file_name,
        path.display(),
        metadata.len(),
        mtime.to_rfc3339()
    );

    let mut chunk = Chunk::new(&file, content, 1, 1, "binary");
    chunk.tags = vec!["executable".to_string()];
    Some(chunk)
}

/// Normalize a file's mtime to UTC at the filesystem boundary
pub fn file_mtime_utc(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
