/// Centralized error types for repo-rag using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the RAG service
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    Store(#[from] VectorStoreError),

    #[error("Indexing error: {0}")]
    Indexing(#[from] IndexingError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to the remote model server
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    RequestFailed(String),

    #[error("Model server returned status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Model server returned an empty embedding")]
    EmptyEmbedding,

    #[error("Failed to parse model server response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors related to vector store operations
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Failed to store chunks: {0}")]
    UpsertFailed(String),

    #[error("Failed to search chunks: {0}")]
    SearchFailed(String),

    #[error("Failed to delete chunks for '{file}': {reason}")]
    DeleteFailed { file: String, reason: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors related to the indexing job
#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Failed to scan directory: {0}")]
    ScanFailed(String),

    #[error("Failed to read file '{file}': {reason}")]
    FileReadFailed { file: String, reason: String },

    #[error("File size exceeds maximum: {size} > {max}")]
    FileTooLarge { size: u64, max: u64 },

    #[error("An indexing job is already running")]
    AlreadyRunning,

    #[error("Indexing was cancelled")]
    Cancelled,
}

/// Errors related to chunking source files
#[derive(Error, Debug)]
pub enum ChunkingError {
    #[error("Failed to parse source: {0}")]
    ParseFailed(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Empty {0}")]
    Empty(String),
}

// Conversion from anyhow::Error to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Other(format!("{:#}", err))
    }
}

impl RagError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        RagError::Other(msg.into())
    }

    /// Check if this is a user error (bad input) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RagError::Validation(_)
                | RagError::Indexing(IndexingError::DirectoryNotFound(_))
                | RagError::Indexing(IndexingError::NotADirectory(_))
        )
    }

    /// Check if this error is retryable against the model server
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::Embedding(EmbeddingError::Timeout(_))
                | RagError::Embedding(EmbeddingError::ServerError { status: 500..=599, .. })
                | RagError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RagError::Validation(ValidationError::PathNotFound("/test".to_string()));
        assert_eq!(
            err.to_string(),
            "Validation error: Path does not exist: /test"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let rag_err: RagError = io_err.into();
        assert!(matches!(rag_err, RagError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let rag_err: RagError = anyhow_err.into();
        assert!(matches!(rag_err, RagError::Other(_)));
    }

    #[test]
    fn test_is_user_error() {
        let user_err = RagError::Validation(ValidationError::Empty("question".to_string()));
        assert!(user_err.is_user_error());

        let user_err = RagError::Indexing(IndexingError::DirectoryNotFound("/gone".to_string()));
        assert!(user_err.is_user_error());

        let system_err = RagError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_is_retryable() {
        let retryable = RagError::Embedding(EmbeddingError::Timeout(300));
        assert!(retryable.is_retryable());

        let retryable = RagError::Embedding(EmbeddingError::ServerError {
            status: 503,
            body: "overloaded".to_string(),
        });
        assert!(retryable.is_retryable());

        let not_retryable = RagError::Embedding(EmbeddingError::ServerError {
            status: 404,
            body: "no such model".to_string(),
        });
        assert!(!not_retryable.is_retryable());

        let not_retryable = RagError::Validation(ValidationError::Empty("question".to_string()));
        assert!(!not_retryable.is_retryable());
    }

    #[test]
    fn test_indexing_error_file_too_large() {
        let err = IndexingError::FileTooLarge {
            size: 2_000_000,
            max: 1_048_576,
        };
        assert_eq!(
            err.to_string(),
            "File size exceeds maximum: 2000000 > 1048576"
        );
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            key: "indexing.embedding_batch_size".to_string(),
            reason: "must be greater than 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'indexing.embedding_batch_size': must be greater than 0"
        );
    }

    #[test]
    fn test_error_chain() {
        let embedding_err = EmbeddingError::EmptyEmbedding;
        let rag_err: RagError = embedding_err.into();
        assert!(matches!(rag_err, RagError::Embedding(_)));
        assert_eq!(
            rag_err.to_string(),
            "Embedding error: Model server returned an empty embedding"
        );
    }

    #[test]
    fn test_rag_error_other() {
        let err = RagError::other("custom error message");
        assert_eq!(err.to_string(), "custom error message");
    }
}
