use crate::core::error::Result;
use crate::search::query::KEYWORDS;
use crossterm::cursor::{MoveToColumn, SetCursorStyle};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType};
use crossterm::{execute, queue};
use std::io::{self, BufRead, Write};

/// What one prompt attempt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C while editing; the caller prompts again
    Interrupted,
    /// Ctrl-D on an empty line, or end of stdin
    Eof,
}

/// Source of query lines for the interactive loop
pub trait LineReader {
    fn read_line(&mut self) -> Result<Input>;
}

/// Colors of the prompt, built once at start-up
#[derive(Debug, Clone)]
pub struct PromptStyle {
    pub marker: String,
    pub marker_color: Color,
    pub input_color: Color,
    pub keyword_color: Color,
}

impl Default for PromptStyle {
    fn default() -> Self {
        Self {
            marker: "> ".to_string(),
            marker_color: Color::Rgb { r: 0x00, g: 0xaa, b: 0x00 },
            input_color: Color::Rgb { r: 0xff, g: 0x00, b: 0x66 },
            keyword_color: Color::Rgb { r: 0x00, g: 0x80, b: 0x00 },
        }
    }
}

/// Suggests completions for the word under the cursor from a fixed word list
#[derive(Debug, Clone)]
pub struct KeywordCompleter {
    words: Vec<&'static str>,
}

impl KeywordCompleter {
    pub fn new(words: &[&'static str]) -> Self {
        Self {
            words: words.to_vec(),
        }
    }

    /// Words starting with `prefix`, in list order
    pub fn candidates(&self, prefix: &str) -> Vec<&'static str> {
        self.words
            .iter()
            .copied()
            .filter(|word| word.starts_with(prefix))
            .collect()
    }
}

impl Default for KeywordCompleter {
    fn default() -> Self {
        Self::new(&KEYWORDS)
    }
}

/// Editable line with a cursor counted in chars
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl LineBuffer {
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn insert(&mut self, c: char) {
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.chars.len();
    }

    pub fn kill_to_start(&mut self) {
        self.chars.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Remove the word before the cursor along with trailing spaces
    pub fn kill_word(&mut self) {
        let mut start = self.cursor;
        while start > 0 && self.chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.chars[start - 1].is_whitespace() {
            start -= 1;
        }
        self.chars.drain(start..self.cursor);
        self.cursor = start;
    }

    /// Start index and text of the word ending at the cursor
    pub fn word_before_cursor(&self) -> (usize, String) {
        let mut start = self.cursor;
        while start > 0 && !is_word_boundary(self.chars[start - 1]) {
            start -= 1;
        }
        (start, self.chars[start..self.cursor].iter().collect())
    }

    /// Replace `start..cursor` with `word`
    pub fn replace_before_cursor(&mut self, start: usize, word: &str) {
        self.chars.splice(start..self.cursor, word.chars());
        self.cursor = start + word.chars().count();
    }
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')' || c == '"'
}

/// Tab cycling through the candidates of one word
#[derive(Debug, Clone)]
struct Completion {
    start: usize,
    candidates: Vec<&'static str>,
    index: usize,
}

/// Split a line into runs, flagging the boolean keywords
pub fn highlight(line: &str) -> Vec<(&str, bool)> {
    let mut spans = Vec::new();
    let mut run_start = 0;
    let mut in_word = false;

    for (offset, c) in line.char_indices() {
        let boundary = is_word_boundary(c);
        if boundary == in_word {
            if offset > run_start {
                let run = &line[run_start..offset];
                spans.push((run, in_word && KEYWORDS.contains(&run)));
            }
            run_start = offset;
            in_word = !boundary;
        }
    }
    if run_start < line.len() {
        let run = &line[run_start..];
        spans.push((run, in_word && KEYWORDS.contains(&run)));
    }
    spans
}

/// Line editor on the controlling terminal
pub struct TerminalPrompt {
    style: PromptStyle,
    completer: KeywordCompleter,
}

impl TerminalPrompt {
    pub fn new(style: PromptStyle, completer: KeywordCompleter) -> Self {
        Self { style, completer }
    }

    fn render(&self, out: &mut impl Write, buffer: &LineBuffer) -> io::Result<()> {
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(self.style.marker_color),
            Print(&self.style.marker),
            ResetColor,
        )?;

        let text = buffer.text();
        for (run, is_keyword) in highlight(&text) {
            if is_keyword {
                queue!(
                    out,
                    SetForegroundColor(self.style.keyword_color),
                    SetAttribute(Attribute::Bold),
                    Print(run),
                    SetAttribute(Attribute::Reset),
                )?;
            } else {
                queue!(out, SetForegroundColor(self.style.input_color), Print(run))?;
            }
        }

        let column = self.style.marker.chars().count() + buffer.cursor();
        queue!(
            out,
            ResetColor,
            MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX))
        )?;
        out.flush()
    }

    fn complete(&self, buffer: &mut LineBuffer, completion: &mut Option<Completion>) {
        if let Some(state) = completion.as_mut() {
            state.index = (state.index + 1) % state.candidates.len();
            buffer.replace_before_cursor(state.start, state.candidates[state.index]);
            return;
        }

        let (start, prefix) = buffer.word_before_cursor();
        let candidates = self.completer.candidates(&prefix);
        if let Some(first) = candidates.first() {
            buffer.replace_before_cursor(start, first);
            *completion = Some(Completion {
                start,
                candidates,
                index: 0,
            });
        }
    }

    fn edit(&self, stdout: &mut io::Stdout) -> Result<Input> {
        let mut buffer = LineBuffer::default();
        let mut completion: Option<Completion> = None;

        loop {
            self.render(stdout, &buffer)?;

            let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = event::read()?
            else {
                continue;
            };

            if code != KeyCode::Tab {
                completion = None;
            }

            let ctrl = modifiers.contains(KeyModifiers::CONTROL);
            match code {
                KeyCode::Char('c') if ctrl => {
                    execute!(stdout, Print("^C\r\n"))?;
                    return Ok(Input::Interrupted);
                }
                KeyCode::Char('d') if ctrl => {
                    if buffer.is_empty() {
                        execute!(stdout, Print("\r\n"))?;
                        return Ok(Input::Eof);
                    }
                    buffer.delete();
                }
                KeyCode::Char('a') if ctrl => buffer.home(),
                KeyCode::Char('e') if ctrl => buffer.end(),
                KeyCode::Char('u') if ctrl => buffer.kill_to_start(),
                KeyCode::Char('w') if ctrl => buffer.kill_word(),
                KeyCode::Char(c) if !ctrl => buffer.insert(c),
                KeyCode::Enter => {
                    execute!(stdout, Print("\r\n"))?;
                    return Ok(Input::Line(buffer.text()));
                }
                KeyCode::Tab => self.complete(&mut buffer, &mut completion),
                KeyCode::Backspace => buffer.backspace(),
                KeyCode::Delete => buffer.delete(),
                KeyCode::Left => buffer.left(),
                KeyCode::Right => buffer.right(),
                KeyCode::Home => buffer.home(),
                KeyCode::End => buffer.end(),
                _ => {}
            }
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new(PromptStyle::default(), KeywordCompleter::default())
    }
}

impl LineReader for TerminalPrompt {
    fn read_line(&mut self) -> Result<Input> {
        enable_raw_mode()?;

        // Leave the terminal usable even if editing fails
        struct TerminalRestore;
        impl Drop for TerminalRestore {
            fn drop(&mut self) {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), SetCursorStyle::DefaultUserShape);
            }
        }
        let _restore = TerminalRestore;

        let mut stdout = io::stdout();
        execute!(stdout, SetCursorStyle::BlinkingUnderScore)?;
        self.edit(&mut stdout)
    }
}

/// Reads plain lines, used when stdin is not a terminal
pub struct PlainLines<R> {
    input: R,
}

impl<R: BufRead> PlainLines<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> LineReader for PlainLines<R> {
    fn read_line(&mut self) -> Result<Input> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Input::Eof);
        }
        Ok(Input::Line(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
