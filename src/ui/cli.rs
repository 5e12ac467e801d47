use crate::core::config::{
    Config, PreviewConfig, DEFAULT_INDEX_DIR, DEFAULT_LIMIT, DEFAULT_PREVIEW_COMMAND,
    DEFAULT_PREVIEW_SIZE,
};
use crate::core::error::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// searchy - Boolean full-text search for a directory of notes
#[derive(Parser, Debug)]
#[command(name = "searchy")]
#[command(about = "Index a directory of markdown notes and search them with AND / OR / NOT queries", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to dir to be indexed
    #[arg(long, value_name = "DIR")]
    pub data: PathBuf,

    /// Run a single query and exit instead of prompting
    #[arg(long, value_name = "QUERY")]
    pub query: Option<String>,

    /// Force reindex (default)
    #[arg(long, overrides_with = "no_reindex")]
    pub reindex: bool,

    /// Reuse the index built by a previous run
    #[arg(long, overrides_with = "reindex")]
    pub no_reindex: bool,

    /// Maximum number of results to return
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Where the index is stored
    #[arg(long, value_name = "DIR", default_value = DEFAULT_INDEX_DIR)]
    pub index_dir: PathBuf,

    /// Preview command; {} is replaced by the note path
    #[arg(long, value_name = "CMD", default_value = DEFAULT_PREVIEW_COMMAND)]
    pub preview: String,

    /// Fraction of the terminal used by the preview
    #[arg(long, value_name = "FRACTION", default_value_t = DEFAULT_PREVIEW_SIZE)]
    pub preview_size: f32,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Reindexing is on unless --no-reindex was the last word
    pub fn reindex(&self) -> bool {
        !self.no_reindex
    }

    /// Build and validate the run configuration. A blank `--query` counts
    /// as absent and leads to the interactive prompt.
    pub fn to_config(&self) -> Result<Config> {
        let config = Config {
            data_dir: self.data.clone(),
            index_dir: self.index_dir.clone(),
            reindex: self.reindex(),
            query: self.query.clone().filter(|query| !query.trim().is_empty()),
            limit: self.limit,
            preview: PreviewConfig {
                command: self.preview.clone(),
                size: self.preview_size,
            },
        };
        config.validate()?;
        Ok(config)
    }
}
