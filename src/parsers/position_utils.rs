//! Cursor positions and ranges used by completion
//!
//! Positions here are 1-based and count characters, the way editor widgets
//! report them. LSP positions are 0-based and count UTF-16 code units, so
//! converting needs the text of the line. Conversions live next to the types
//! so the rest of the crate never does that arithmetic itself.

use tower_lsp::lsp_types::{Position, Range};

/// A 1-based (line, column) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Converts an LSP position on `line`, the text of the position's line.
    pub fn from_lsp(position: Position, line: &str) -> Self {
        Self {
            line: position.line as usize + 1,
            column: utf16_to_chars(line, position.character as usize) + 1,
        }
    }

    /// Converts to an LSP position on `line`, the text of the cursor's line.
    pub fn to_lsp(self, line: &str) -> Position {
        Position::new(
            self.line.saturating_sub(1) as u32,
            chars_to_utf16(line, self.column.saturating_sub(1)) as u32,
        )
    }
}

/// Number of chars covered by the first `units` UTF-16 code units of `line`.
///
/// Units past the end of the line count as one char each, so an offset
/// beyond the line stays beyond it. An offset inside a surrogate pair
/// rounds up to the end of that char.
fn utf16_to_chars(line: &str, units: usize) -> usize {
    let mut consumed = 0;
    let mut chars = 0;
    for ch in line.chars() {
        if consumed >= units {
            return chars;
        }
        consumed += ch.len_utf16();
        chars += 1;
    }
    chars + units.saturating_sub(consumed)
}

/// Number of UTF-16 code units in the first `chars` chars of `line`.
fn chars_to_utf16(line: &str, chars: usize) -> usize {
    let mut units = 0;
    let mut counted = 0;
    for ch in line.chars().take(chars) {
        units += ch.len_utf16();
        counted += 1;
    }
    units + (chars - counted)
}

/// A single-line range, 1-based, end column exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceRange {
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl ReplaceRange {
    pub fn new(line: usize, start_column: usize, end_column: usize) -> Self {
        Self { line, start_column, end_column }
    }

    /// Converts to an LSP range on `line`, widened so that it contains
    /// `cursor`.
    ///
    /// LSP clients reject completion edits whose range does not include the
    /// request position.
    pub fn to_lsp_containing(self, cursor: CursorPosition, line: &str) -> Range {
        let start = CursorPosition::new(self.line, self.start_column.min(cursor.column));
        let end = CursorPosition::new(self.line, self.end_column.max(cursor.column));
        Range::new(start.to_lsp(line), end.to_lsp(line))
    }
}

/// Returns the text of the cursor line up to the cursor.
///
/// `None` if the cursor lies outside `lines`.
pub fn line_prefix<'a>(lines: &[&'a str], cursor: CursorPosition) -> Option<&'a str> {
    let index = cursor.line.checked_sub(1)?;
    let line = *lines.get(index)?;
    let chars = cursor.column.checked_sub(1)?;

    match line.char_indices().nth(chars) {
        Some((offset, _)) => Some(&line[..offset]),
        None if line.chars().count() == chars => Some(line),
        None => None,
    }
}
