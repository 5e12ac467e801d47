use crate::core::config::Config;
use crate::core::error::Result;
use crate::indexing::discovery::discover_notes;
use crate::storage::index::{NoteIndex, SearchIndex};
use crate::ui::menu::Presenter;
use crate::ui::prompt::{Input, LineReader};
use std::io::Write;
use tracing::info;

/// Printed when the interactive loop ends
pub const FAREWELL: &str = "GoodBye!";

/// Build a fresh index from the data directory, or reopen the previous one
pub fn load_index(config: &Config) -> Result<NoteIndex> {
    if !config.reindex {
        return NoteIndex::open(&config.index_dir);
    }

    let notes = discover_notes(&config.data_dir)?;
    let (index, stats) = NoteIndex::build(&config.index_dir, notes)?;
    info!(
        "Indexed {} notes from {} ({} skipped)",
        stats.indexed,
        config.data_dir.display(),
        stats.skipped.len()
    );
    Ok(index)
}

/// One program run: an index plus the way results are shown
pub struct Session<I, P> {
    index: I,
    presenter: P,
    limit: usize,
}

impl<I: SearchIndex, P: Presenter> Session<I, P> {
    pub fn new(index: I, presenter: P, limit: usize) -> Self {
        Self {
            index,
            presenter,
            limit,
        }
    }

    /// Search once and present the results
    pub fn run_query(&mut self, text: &str) -> Result<()> {
        let documents = self.index.search_str(text, self.limit)?;
        self.presenter.present(&documents)
    }

    /// Prompt for queries until end of input. Malformed queries are reported
    /// and the loop carries on; any other failure ends it.
    pub fn run_interactive<R, W>(&mut self, reader: &mut R, out: &mut W) -> Result<()>
    where
        R: LineReader + ?Sized,
        W: Write,
    {
        loop {
            let line = match reader.read_line()? {
                Input::Line(line) => line,
                Input::Interrupted => continue,
                Input::Eof => break,
            };

            let query = line.trim();
            if query.is_empty() {
                continue;
            }

            writeln!(out, "Searching: {}", query)?;
            out.flush()?;

            match self.run_query(query) {
                Ok(()) => {}
                Err(err) if err.is_query_syntax() => {
                    writeln!(out, "{}", err)?;
                }
                Err(err) => return Err(err),
            }
        }

        writeln!(out, "{}", FAREWELL)?;
        out.flush()?;
        Ok(())
    }
}
