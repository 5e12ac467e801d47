use crate::core::error::{Error, Result};
use ignore::{Walk, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A note file found during discovery. Content is read on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File name without its extension
    pub name: String,
}

impl Note {
    fn new(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    /// Read the full text of the note
    pub fn content(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| Error::Read {
            path: self.path.clone(),
            source,
        })
    }
}

/// Lazy sequence of notes under a directory
pub struct NoteIter {
    walker: Walk,
}

impl Iterator for NoteIter {
    type Item = Note;

    fn next(&mut self) -> Option<Note> {
        for result in self.walker.by_ref() {
            match result {
                Ok(entry) => {
                    let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
                    if is_file && is_notes_file(entry.path()) {
                        return Some(Note::new(entry.into_path()));
                    }
                }
                Err(err) => {
                    // Unreadable entries are reported but do not end the walk
                    warn!("Failed to access file: {}", err);
                }
            }
        }
        None
    }
}

/// Discover all note files under a directory, recursively
pub fn discover_notes(root: &Path) -> Result<NoteIter> {
    if !root.exists() {
        return Err(Error::Config(format!(
            "Directory does not exist: {}",
            root.display()
        )));
    }

    if !root.is_dir() {
        return Err(Error::Config(format!(
            "Path is not a directory: {}",
            root.display()
        )));
    }

    let root = std::path::absolute(root)?;

    // Every note counts, including hidden and git-ignored ones
    let walker = WalkBuilder::new(&root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    Ok(NoteIter { walker })
}

/// Check if a file is a supported notes file based on extension
pub fn is_notes_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_lowercase().as_str(),
                "md" | "markdown" | "mdown" | "mkd" | "mkdn"
            )
        })
        .unwrap_or(false)
}
