use crate::core::error::{Error, Result};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Placeholder replaced by the note path in a preview template
const PATH_PLACEHOLDER: &str = "{}";

/// External command that renders a note for the preview pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewCommand {
    program: String,
    args: Vec<String>,
}

impl PreviewCommand {
    /// Split a template such as `glow {}` into program and arguments.
    /// The path is appended when the template has no placeholder.
    pub fn parse(template: &str) -> Result<Self> {
        let mut words = template.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| Error::Config("Preview command is empty".to_string()))?;
        let mut args: Vec<String> = words.collect();

        let has_placeholder = program.contains(PATH_PLACEHOLDER)
            || args.iter().any(|arg| arg.contains(PATH_PLACEHOLDER));
        if !has_placeholder {
            args.push(PATH_PLACEHOLDER.to_string());
        }

        Ok(Self { program, args })
    }

    /// Build the process for one note; no shell is involved
    pub fn command_for(&self, path: &str) -> Command {
        let mut command = Command::new(self.program.replace(PATH_PLACEHOLDER, path));
        command.args(self.args.iter().map(|arg| arg.replace(PATH_PLACEHOLDER, path)));
        command
    }

    /// Preview text for a note. Falls back to the note's own text when the
    /// command is missing or fails, and to nothing when that is unreadable too.
    pub fn render(&self, path: &str) -> String {
        match self.run(path) {
            Some(text) => text,
            None => std::fs::read_to_string(Path::new(path))
                .map(|source| markdown_to_text(&source))
                .unwrap_or_default(),
        }
    }

    fn run(&self, path: &str) -> Option<String> {
        let output = self
            .command_for(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Some(strip_ansi(&String::from_utf8_lossy(&output.stdout)))
            }
            Ok(output) => {
                debug!(program = %self.program, status = %output.status, "preview command failed");
                None
            }
            Err(err) => {
                debug!(program = %self.program, error = %err, "preview command unavailable");
                None
            }
        }
    }
}

/// Remove terminal escape sequences (CSI and OSC) from command output
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('[') => {
                // Parameters and intermediates, then one final byte in @..~
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                // Ends at BEL or ESC \
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    out
}

/// Plain-text rendering of markdown for the fallback preview
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                text.push_str(&"#".repeat(level as usize));
                text.push(' ');
            }
            Event::Start(Tag::Item) => text.push_str("- "),
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Heading(_) | TagEnd::Paragraph | TagEnd::CodeBlock) => {
                text.push_str("\n\n")
            }
            Event::End(TagEnd::Item) => text.push('\n'),
            _ => {}
        }
    }

    text.trim_end().to_string()
}
