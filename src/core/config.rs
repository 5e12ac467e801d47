use super::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Where the corpus lives unless overridden, relative to the working directory
pub const DEFAULT_INDEX_DIR: &str = "indexdir";
/// Maximum results per search
pub const DEFAULT_LIMIT: usize = 10;
/// Preview command template; `{}` is replaced by the note path
pub const DEFAULT_PREVIEW_COMMAND: &str = "glow {}";
/// Fraction of the terminal given to the preview pane
pub const DEFAULT_PREVIEW_SIZE: f32 = 0.75;

/// Settings for the live preview shown next to the result menu
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    pub command: String,
    pub size: f32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_PREVIEW_COMMAND.to_string(),
            size: DEFAULT_PREVIEW_SIZE,
        }
    }
}

/// Configuration for one searchy run
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of notes to index
    pub data_dir: PathBuf,
    /// Directory holding the on-disk corpus
    pub index_dir: PathBuf,
    /// Rebuild the corpus instead of reopening it
    pub reindex: bool,
    /// One-shot query; interactive mode when absent
    pub query: Option<String>,
    pub limit: usize,
    pub preview: PreviewConfig,
}

impl Config {
    /// Create a configuration with defaults for everything but the data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            reindex: true,
            query: None,
            limit: DEFAULT_LIMIT,
            preview: PreviewConfig::default(),
        }
    }

    /// Check every setting before any indexing work starts
    pub fn validate(&self) -> Result<()> {
        validate_data_dir(&self.data_dir)?;

        if self.limit == 0 {
            return Err(Error::Config("--limit must be at least 1".to_string()));
        }

        if !(self.preview.size > 0.0 && self.preview.size < 1.0) {
            return Err(Error::Config(format!(
                "--preview-size must be between 0 and 1, got {}",
                self.preview.size
            )));
        }

        if self.preview.command.trim().is_empty() {
            return Err(Error::Config("--preview must not be empty".to_string()));
        }

        Ok(())
    }
}

/// The data directory must exist, be a directory, and be readable and writable
fn validate_data_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Directory does not exist: {}",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(path)?;
    if !metadata.is_dir() {
        return Err(Error::Config(format!(
            "Path is not a directory: {}",
            path.display()
        )));
    }

    if std::fs::read_dir(path).is_err() {
        return Err(Error::Config(format!(
            "Directory is not readable: {}",
            path.display()
        )));
    }

    if metadata.permissions().readonly() {
        return Err(Error::Config(format!(
            "Directory is not writable: {}",
            path.display()
        )));
    }

    Ok(())
}
