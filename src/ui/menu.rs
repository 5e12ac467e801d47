use crate::core::config::PreviewConfig;
use crate::core::error::Result;
use crate::storage::index::Document;
use crate::ui::preview::PreviewCommand;
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use std::collections::HashMap;
use std::io::{self, Write};

/// Message printed when a search matches nothing
pub const NO_RESULTS: &str = "No results!";

/// Lines scrolled by PageUp / PageDown in the preview
const PREVIEW_PAGE: u16 = 10;

/// Lets the user pick one entry, or none
pub trait Menu {
    fn show(&mut self, entries: &[String]) -> Result<Option<usize>>;
}

impl<M: Menu + ?Sized> Menu for Box<M> {
    fn show(&mut self, entries: &[String]) -> Result<Option<usize>> {
        (**self).show(entries)
    }
}

/// Shows search results to the user
pub trait Presenter {
    fn present(&mut self, documents: &[Document]) -> Result<()>;
}

/// Presents results through a [`Menu`] and reports the selection
pub struct ResultPresenter<M, W> {
    menu: M,
    out: W,
}

impl<M: Menu, W: Write> ResultPresenter<M, W> {
    pub fn new(menu: M, out: W) -> Self {
        Self { menu, out }
    }
}

impl<M: Menu, W: Write> Presenter for ResultPresenter<M, W> {
    fn present(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            writeln!(self.out, "{}", NO_RESULTS)?;
            return Ok(());
        }

        let entries: Vec<String> = documents.iter().map(|doc| doc.path.clone()).collect();
        if let Some(index) = self.menu.show(&entries)? {
            if let Some(path) = entries.get(index) {
                writeln!(self.out, "{} {}", index, path)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Prints every entry instead of prompting; used when stdout is not a terminal
pub struct ListingMenu<W> {
    out: W,
}

impl<W: Write> ListingMenu<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Menu for ListingMenu<W> {
    fn show(&mut self, entries: &[String]) -> Result<Option<usize>> {
        for (index, entry) in entries.iter().enumerate() {
            writeln!(self.out, "{} {}", index, entry)?;
        }
        Ok(None)
    }
}

/// Full-screen selection menu with a live preview pane
pub struct TerminalMenu {
    preview: PreviewCommand,
    preview_size: f32,
}

impl TerminalMenu {
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        Ok(Self {
            preview: PreviewCommand::parse(&config.command)?,
            preview_size: config.size,
        })
    }

    fn run(
        &self,
        terminal: &mut ratatui::Terminal<CrosstermBackend<io::Stdout>>,
        entries: &[String],
    ) -> Result<Option<usize>> {
        let mut state = MenuState::new(entries.len());
        let mut previews: HashMap<usize, String> = HashMap::new();

        loop {
            let preview = previews
                .entry(state.selected)
                .or_insert_with(|| self.preview.render(&entries[state.selected]))
                .as_str();
            terminal.draw(|f| self.render(f, entries, &state, preview))?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Char('c') if ctrl => return Ok(None),
                KeyCode::Esc | KeyCode::Char('q') => return Ok(None),
                KeyCode::Enter => return Ok(Some(state.selected)),
                KeyCode::Up | KeyCode::Char('k') => state.up(),
                KeyCode::Down | KeyCode::Char('j') => state.down(),
                KeyCode::Home | KeyCode::Char('g') => state.first(),
                KeyCode::End | KeyCode::Char('G') => state.last(),
                KeyCode::PageUp => state.scroll = state.scroll.saturating_sub(PREVIEW_PAGE),
                KeyCode::PageDown => state.scroll = state.scroll.saturating_add(PREVIEW_PAGE),
                _ => {}
            }
        }
    }

    fn render(&self, f: &mut Frame, entries: &[String], state: &MenuState, preview: &str) {
        let preview_percent = ((self.preview_size * 100.0).round() as u16).clamp(1, 99);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(100 - preview_percent), // Results
                Constraint::Percentage(preview_percent),       // Preview
            ])
            .split(f.size());

        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| ListItem::new(Line::from(entry.as_str())))
            .collect();

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut list_state = ListState::default();
        list_state.select(Some(state.selected));
        f.render_stateful_widget(list, chunks[0], &mut list_state);

        let title = Span::styled(
            entries[state.selected].as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        );
        let preview = Paragraph::new(preview)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(title),
            )
            .scroll((state.scroll, 0));
        f.render_widget(preview, chunks[1]);
    }
}

impl Menu for TerminalMenu {
    fn show(&mut self, entries: &[String]) -> Result<Option<usize>> {
        if entries.is_empty() {
            return Ok(None);
        }

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        // Always restore terminal, even if we early-return with an error.
        struct TerminalRestore;
        impl Drop for TerminalRestore {
            fn drop(&mut self) {
                let _ = disable_raw_mode();
                let mut stdout = io::stdout();
                let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
            }
        }
        let _restore = TerminalRestore;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;
        self.run(&mut terminal, entries)
    }
}

/// Cursor position in the menu and scroll offset of the preview
#[derive(Debug, Clone, PartialEq, Eq)]
struct MenuState {
    len: usize,
    selected: usize,
    scroll: u16,
}

impl MenuState {
    fn new(len: usize) -> Self {
        Self {
            len,
            selected: 0,
            scroll: 0,
        }
    }

    fn select(&mut self, index: usize) {
        if index != self.selected {
            self.selected = index;
            self.scroll = 0;
        }
    }

    /// Moves wrap around at both ends
    fn up(&mut self) {
        let index = if self.selected == 0 { self.len - 1 } else { self.selected - 1 };
        self.select(index);
    }

    fn down(&mut self) {
        self.select((self.selected + 1) % self.len);
    }

    fn first(&mut self) {
        self.select(0);
    }

    fn last(&mut self) {
        self.select(self.len - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingMenu {
        calls: usize,
        choice: Option<usize>,
    }

    impl Menu for RecordingMenu {
        fn show(&mut self, _entries: &[String]) -> Result<Option<usize>> {
            self.calls += 1;
            Ok(self.choice)
        }
    }

    fn doc(path: &str) -> Document {
        Document {
            title: path.trim_end_matches(".md").to_string(),
            path: path.to_string(),
            score: 1.0,
        }
    }

    fn present(choice: Option<usize>, documents: &[Document]) -> (String, usize) {
        let mut out = Vec::new();
        let mut presenter = ResultPresenter::new(RecordingMenu { calls: 0, choice }, &mut out);
        presenter.present(documents).unwrap();
        let calls = presenter.menu.calls;
        drop(presenter);
        (String::from_utf8(out).unwrap(), calls)
    }

    #[test]
    fn test_no_results_skips_menu() {
        let (output, calls) = present(Some(0), &[]);
        assert_eq!(output, "No results!\n");
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_selection_prints_index_and_path() {
        let (output, calls) = present(Some(1), &[doc("/n/a.md"), doc("/n/b.md")]);
        assert_eq!(output, "1 /n/b.md\n");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_cancel_prints_nothing() {
        let (output, calls) = present(None, &[doc("/n/a.md")]);
        assert_eq!(output, "");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_listing_menu_prints_ranked_entries() {
        let mut out = Vec::new();
        let entries = vec!["/n/a.md".to_string(), "/n/b.md".to_string()];
        let choice = ListingMenu::new(&mut out).show(&entries).unwrap();
        assert_eq!(choice, None);
        assert_eq!(String::from_utf8(out).unwrap(), "0 /n/a.md\n1 /n/b.md\n");
    }

    #[test]
    fn test_menu_state_wraps_and_resets_scroll() {
        let mut state = MenuState::new(3);
        state.up();
        assert_eq!(state.selected, 2);
        state.down();
        assert_eq!(state.selected, 0);

        state.scroll = 20;
        state.last();
        assert_eq!(state.selected, 2);
        assert_eq!(state.scroll, 0);

        state.scroll = 5;
        state.last();
        assert_eq!(state.scroll, 5);
    }
}
