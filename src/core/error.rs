use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No index found at {}. Run again with --reindex to build one.", path.display())]
    IndexNotFound { path: PathBuf },

    #[error("Invalid query at position {position}: {message}")]
    QuerySyntax { position: usize, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index error: {0}")]
    Index(String),
}

impl Error {
    /// Wrap a tantivy failure, keeping only its message
    pub(crate) fn index(context: &str, source: &tantivy::TantivyError) -> Self {
        Self::Index(format!("{}: {}", context, source))
    }

    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::QuerySyntax {
            position,
            message: message.into(),
        }
    }

    /// Whether the error is a recoverable problem with user input
    pub fn is_query_syntax(&self) -> bool {
        matches!(self, Self::QuerySyntax { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
