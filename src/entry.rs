//! Launcher entries and the entry-file parser.
//!
//! An entry file holds one *logical line* per entry:
//!
//! ```text
//! # power menu
//! Lock,/usr/share/icons/lock.png,loginctl lock-session
//! Suspend,200,200,system-suspend,systemctl suspend
//! rowbreak
//! infobar,acpi -b
//! infobar,18,date +%H:%M
//! colbreak
//! Reboot,hicolor:system-reboot,\
//!   systemctl reboot
//! ```
//!
//! `#` starts a comment (write `\#` for a literal hash), blank lines are
//! ignored and a trailing `\` joins a line with the next one.

use crate::icon::IconResolver;
use std::path::{Path, PathBuf};

/// Stable identifier of a button or infobar, assigned in file order from 0.
pub type EntryId = u32;

/// One configured launcher entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Button(Button),
    Infobar(Infobar),
    /// Close the current row; stay in the current column.
    RowBreak,
    /// Close the current row and the current column.
    ColBreak,
}

/// A clickable button that launches `command`.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub id: EntryId,
    pub label: String,
    /// Resolved icon file, `None` when the reference could not be found.
    pub icon: Option<PathBuf>,
    pub command: String,
    pub width: u32,
    pub height: u32,
}

/// A text widget showing the output of a periodically re-run command.
#[derive(Debug, Clone, PartialEq)]
pub struct Infobar {
    pub id: EntryId,
    pub command: String,
    pub font_size: u32,
}

impl Entry {
    /// The entry id, or `None` for row/column breaks.
    pub fn id(&self) -> Option<EntryId> {
        match self {
            Entry::Button(b) => Some(b.id),
            Entry::Infobar(i) => Some(i.id),
            Entry::RowBreak | Entry::ColBreak => None,
        }
    }
}

/// Widget name used for a button in generated markup.
pub fn button_widget_name(id: EntryId) -> String {
    format!("button{}", id)
}

/// Widget name used for an infobar in generated markup.
pub fn infobar_widget_name(id: EntryId) -> String {
    format!("infobar{}", id)
}

/// Sizes applied when an entry line omits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryDefaults {
    pub button_width: u32,
    pub button_height: u32,
    pub infobar_font_size: u32,
}

impl Default for EntryDefaults {
    fn default() -> Self {
        Self {
            button_width: 150,
            button_height: 180,
            infobar_font_size: 32,
        }
    }
}

/// A logical line that does not match any entry form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error parsing config line {line}: {text:?} ({reason})")]
pub struct ParseError {
    /// 1-based physical line on which the logical line starts.
    pub line: usize,
    /// The joined logical line, comments removed.
    pub text: String,
    pub reason: String,
}

/// Failure to load an entry file from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{} is missing", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Read and parse the entry file at `path`.
pub fn load_entries(
    path: &Path,
    defaults: EntryDefaults,
    icons: &IconResolver,
) -> Result<Vec<Entry>, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    let text =
        std::fs::read_to_string(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    Ok(parse_entries(&text, defaults, icons)?)
}

/// Parse entry-file text into entries in file order.
///
/// Empty input yields an empty list.
pub fn parse_entries(
    text: &str,
    defaults: EntryDefaults,
    icons: &IconResolver,
) -> Result<Vec<Entry>, ParseError> {
    let mut parser = LineParser {
        defaults,
        icons,
        next_id: 0,
    };
    logical_lines(text)
        .iter()
        .map(|line| parser.parse(line))
        .collect()
}

//  Logical lines

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogicalLine {
    line_no: usize,
    text: String,
}

/// Drop everything after the first unescaped `#`; `\#` becomes `#`.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                chars.next();
                out.push('#');
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}

/// Join continuation lines and skip blanks and comments.
///
/// A continuation left open at the end of input still becomes a final
/// logical line.
fn logical_lines(text: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (idx, raw) in text.lines().enumerate() {
        let stripped = strip_comment(raw);
        let line = stripped.trim();
        if line.is_empty() {
            continue;
        }
        let (body, continues) = match line.strip_suffix('\\') {
            Some(body) => (body, true),
            None => (line, false),
        };
        let current = pending.get_or_insert_with(|| LogicalLine {
            line_no: idx + 1,
            text: String::new(),
        });
        current.text.push_str(body);
        if !continues {
            lines.extend(pending.take());
        }
    }
    lines.extend(pending.take());
    lines
}

//  Entry parsing

struct LineParser<'a> {
    defaults: EntryDefaults,
    icons: &'a IconResolver,
    next_id: EntryId,
}

impl LineParser<'_> {
    fn parse(&mut self, line: &LogicalLine) -> Result<Entry, ParseError> {
        let text = line.text.as_str();
        let Some((head, rest)) = text.split_once(',') else {
            return match text.trim() {
                "rowbreak" => Ok(Entry::RowBreak),
                "colbreak" => Ok(Entry::ColBreak),
                _ => Err(fail(line, "expected rowbreak, colbreak, infobar or button")),
            };
        };

        if head.trim() == "infobar" {
            self.infobar(line, rest)
        } else {
            self.button(line)
        }
    }

    fn infobar(&mut self, line: &LogicalLine, rest: &str) -> Result<Entry, ParseError> {
        let (font_size, command) = match rest.split_once(',') {
            Some((size, cmd)) => match size.trim().parse::<u32>() {
                Ok(size) => (size, cmd),
                Err(_) => (self.defaults.infobar_font_size, rest),
            },
            None => (self.defaults.infobar_font_size, rest),
        };
        let command = command.trim();
        if command.is_empty() {
            return Err(fail(line, "infobar command is empty"));
        }
        Ok(Entry::Infobar(Infobar {
            id: self.take_id(),
            command: command.to_string(),
            font_size,
        }))
    }

    fn button(&mut self, line: &LogicalLine) -> Result<Entry, ParseError> {
        let sized: Vec<&str> = line.text.splitn(5, ',').collect();
        if let [label, width, height, icon, command] = sized.as_slice() {
            if let (Ok(width), Ok(height)) =
                (width.trim().parse::<u32>(), height.trim().parse::<u32>())
            {
                return self.make_button(line, label, icon, command, width, height);
            }
        }

        let plain: Vec<&str> = line.text.splitn(3, ',').collect();
        match plain.as_slice() {
            [label, icon, command] => {
                let (w, h) = (self.defaults.button_width, self.defaults.button_height);
                self.make_button(line, label, icon, command, w, h)
            }
            _ => Err(fail(
                line,
                "expected LABEL,ICON,COMMAND or LABEL,WIDTH,HEIGHT,ICON,COMMAND",
            )),
        }
    }

    fn make_button(
        &mut self,
        line: &LogicalLine,
        label: &str,
        icon: &str,
        command: &str,
        width: u32,
        height: u32,
    ) -> Result<Entry, ParseError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(fail(line, "button command is empty"));
        }
        Ok(Entry::Button(Button {
            id: self.take_id(),
            label: label.trim().to_string(),
            icon: self.icons.resolve(icon.trim()),
            command: command.to_string(),
            width,
            height,
        }))
    }

    fn take_id(&mut self) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn fail(line: &LogicalLine, reason: &str) -> ParseError {
    ParseError {
        line: line.line_no,
        text: line.text.clone(),
        reason: reason.to_string(),
    }
}

//  Tests
