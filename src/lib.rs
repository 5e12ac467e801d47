// Core functionality
pub mod core {
    pub mod config;
    pub mod error;
}

// Full-text index
pub mod storage {
    pub mod index;
}

// Note discovery
pub mod indexing {
    pub mod discovery;
}

// Query language
pub mod search {
    pub mod compile;
    pub mod query;
}

// User interfaces
pub mod ui {
    pub mod cli;
    pub mod menu;
    pub mod preview;
    pub mod prompt;
}

pub mod session;

// Re-export commonly used types
pub use core::config::Config;
pub use core::error::{Error, Result};
pub use indexing::discovery::{discover_notes, Note};
pub use search::query::{Query, QueryExpr, QueryField};
pub use session::{load_index, Session};
pub use storage::index::{BuildStats, Document, NoteIndex, SearchIndex};
pub use ui::cli::Cli;
pub use ui::menu::{ListingMenu, Menu, Presenter, ResultPresenter, TerminalMenu};
pub use ui::prompt::{
    Input, KeywordCompleter, LineReader, PlainLines, PromptStyle, TerminalPrompt,
};
