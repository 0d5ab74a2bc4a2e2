//! Cell-level detection of the cursor slot on a data row
//!
//! Robot Framework rows are split into cells by a column separator: two or
//! more spaces, or a tab optionally surrounded by single spaces. A row that
//! starts with a separator is a step; its first cell (after an optional
//! `${var} =` assignment) names the keyword to call. A row that does not start
//! with a separator is a header or a test/keyword name.
//!
//! Other Unicode whitespace is ordinary cell content.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading separators of a step row.
static INDENTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?: {2,}| ?\t ?)+").expect("indentation pattern is valid"));

/// Leading separators plus an optional `${var} =` assignment cell.
static KEYWORD_CELL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?: {2,}| ?\t ?)+(?:[$&%@]\{.*?\} ?=?(?: {2,}| ?\t ?))?")
        .expect("keyword cell pattern is valid")
});

const VARIABLE_OPENERS: [&str; 4] = ["${", "@{", "&{", "%{"];

/// What the text before the cursor says about the cursor's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalSlot {
    /// The row has no leading separator.
    LineStart,
    /// The cursor is in the keyword cell of a step row. `cell_start` is the
    /// 1-based column where that cell begins.
    KeywordNameSlot { cell_start: usize },
    /// Anywhere else: argument cells, comments, inside variables, an
    /// assignment not yet followed by its separator.
    Other,
}

/// Returns true if `text` contains a column separator.
pub fn contains_separator(text: &str) -> bool {
    text.contains("  ") || text.contains('\t')
}

/// Classifies the text of the current line up to the cursor.
pub fn detect_slot(prefix: &str) -> LexicalSlot {
    if !INDENTATION.is_match(prefix) {
        return LexicalSlot::LineStart;
    }

    let consumed = KEYWORD_CELL_PREFIX
        .find(prefix)
        .map_or(0, |found| found.end());
    let cell = &prefix[consumed..];

    if contains_separator(cell)
        || cell.starts_with('#')
        || starts_with_variable(cell)
        || has_open_variable(cell)
    {
        return LexicalSlot::Other;
    }

    LexicalSlot::KeywordNameSlot {
        cell_start: prefix[..consumed].chars().count() + 1,
    }
}

/// True iff the line has no leading indentation.
pub fn is_line_start(prefix: &str) -> bool {
    matches!(detect_slot(prefix), LexicalSlot::LineStart)
}

/// True iff the cursor sits in the keyword-name cell of a step row.
pub fn is_at_keyword_slot(prefix: &str) -> bool {
    matches!(detect_slot(prefix), LexicalSlot::KeywordNameSlot { .. })
}

/// An assignment still being typed, before its closing separator.
fn starts_with_variable(cell: &str) -> bool {
    VARIABLE_OPENERS.iter().any(|opener| cell.starts_with(opener))
}

fn has_open_variable(cell: &str) -> bool {
    VARIABLE_OPENERS
        .iter()
        .filter_map(|opener| cell.rfind(opener))
        .max()
        .is_some_and(|start| !cell[start..].contains('}'))
}
