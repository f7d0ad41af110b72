//! Core data types shared across the indexing and retrieval pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A contiguous slice of one source file; the unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable unique id, generated on first creation
    pub id: String,
    /// Absolute path of the source file
    pub file_path: String,
    /// Basename of the source file
    pub file_name: String,
    /// The chunk text
    pub content: String,
    /// 1-based inclusive start line in the source file
    pub start_line: usize,
    /// 1-based inclusive end line in the source file
    pub end_line: usize,
    /// Source file mtime (UTC) at indexing time
    pub last_modified: DateTime<Utc>,
    /// Dense vector; absent until embedded
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Language tag, e.g. "csharp", "sql", "markdown"
    pub language: String,
    /// Method name, when the structured chunker could extract one
    #[serde(default)]
    pub function_name: Option<String>,
    /// Enclosing type name, when the structured chunker could extract one
    #[serde(default)]
    pub class_name: Option<String>,
    /// Free-form classification tags, e.g. "method", "table-definition"
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Chunk {
    /// Create a chunk for a span of `file`, with a fresh random id
    pub fn new(
        file: &SourceFile,
        content: String,
        start_line: usize,
        end_line: usize,
        language: &str,
    ) -> Self {
        debug_assert!(start_line >= 1 && start_line <= end_line);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file.path.to_string_lossy().to_string(),
            file_name: file.file_name.clone(),
            content,
            start_line,
            end_line,
            last_modified: file.last_modified,
            embedding: None,
            language: language.to_string(),
            function_name: None,
            class_name: None,
            tags: Vec::new(),
        }
    }
}

/// A source file read from disk, handed from the crawler to a chunker
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub content: String,
    /// File mtime normalized to UTC
    pub last_modified: DateTime<Utc>,
}

impl SourceFile {
    pub fn new(path: &Path, content: String, last_modified: DateTime<Utc>) -> Self {
        Self {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            content,
            last_modified,
        }
    }

    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// Observable progress of the indexing job
///
/// Written only by the running job; readers receive cloned snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub is_indexing: bool,
    pub message: String,
    pub total_files: usize,
    pub processed_files: usize,
    /// Path currently being processed; best-effort
    pub current_file: Option<String>,
}

/// A search hit: a chunk plus its cosine similarity to the query
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Cosine similarity, in [-1, 1]
    pub similarity: f32,
}

/// Project archetype detected from marker files at a root directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    DotNetCore,
    DotNetFramework,
    WebForms,
    Python,
    NodeJs,
    Angular,
    React,
    Vue,
    Java,
    SqlDatabase,
    Mixed,
    Unknown,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProjectType::DotNetCore => ".NET Core",
            ProjectType::DotNetFramework => ".NET Framework",
            ProjectType::WebForms => "WebForms",
            ProjectType::Python => "Python",
            ProjectType::NodeJs => "Node.js",
            ProjectType::Angular => "Angular",
            ProjectType::React => "React",
            ProjectType::Vue => "Vue",
            ProjectType::Java => "Java",
            ProjectType::SqlDatabase => "SQL Database",
            ProjectType::Mixed => "Mixed",
            ProjectType::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}
