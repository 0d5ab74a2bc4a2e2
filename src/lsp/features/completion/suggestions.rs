//! Suggestion building
//!
//! Two disjoint suggestion sets exist. At the start of a row the missing
//! section headers are offered; in the keyword cell of a step inside Test
//! Cases or Keywords, the keywords of the imported libraries and BuiltIn.
//! Every other position yields nothing.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tracing::debug;

use crate::catalog::{KeywordCatalog, KeywordSpec};
use crate::parsers::position_utils::{CursorPosition, ReplaceRange};
use crate::parsers::robot::{LexicalSlot, SectionKind, split_lines};

use super::context::determine_context;

/// Separator inserted between a keyword and its argument placeholders.
const ARGUMENT_SEPARATOR: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    SectionHeader,
    Keyword,
}

/// A completion proposal, independent of the editor protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub insert_text: String,
    /// Markdown; empty for section headers.
    pub documentation: String,
    pub replace_range: ReplaceRange,
    pub kind: SuggestionKind,
    /// Library that provides a keyword suggestion.
    pub detail: Option<String>,
    /// `insert_text` contains `${n:name}` tab stops.
    pub is_snippet: bool,
}

/// Completion entry point for raw document text.
///
/// Never fails: a cursor outside the document, or at a position where
/// nothing applies, yields an empty list.
pub fn provide_completions(text: &str, cursor: CursorPosition, catalog: &KeywordCatalog) -> Vec<Suggestion> {
    let lines = split_lines(text);
    build_suggestions(&lines, cursor, catalog)
}

/// Builds suggestions for a document given as lines.
pub fn build_suggestions(lines: &[&str], cursor: CursorPosition, catalog: &KeywordCatalog) -> Vec<Suggestion> {
    let Some(context) = determine_context(lines, cursor) else {
        debug!("Completion requested outside the document at {:?}", cursor);
        return Vec::new();
    };

    match context.slot {
        LexicalSlot::LineStart => section_suggestions(&context.scan.existing_sections, cursor),
        LexicalSlot::KeywordNameSlot { cell_start } if context.accepts_keywords() => {
            let range = ReplaceRange::new(cursor.line, cell_start, cursor.column);
            catalog
                .applicable_keywords(context.imported_libraries.as_slice())
                .into_iter()
                .map(|(keyword, library)| keyword_suggestion(keyword, library, range))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn section_suggestions(existing: &BTreeSet<SectionKind>, cursor: CursorPosition) -> Vec<Suggestion> {
    // Headers replace the whole row, so the range is pinned to column 1.
    let range = ReplaceRange::new(cursor.line, 1, 1);

    SectionKind::ALL
        .into_iter()
        .filter(|kind| !existing.contains(kind))
        .map(|kind| Suggestion {
            label: kind.canonical_header().to_string(),
            insert_text: kind.canonical_header().to_string(),
            documentation: String::new(),
            replace_range: range,
            kind: SuggestionKind::SectionHeader,
            detail: None,
            is_snippet: false,
        })
        .collect()
}

fn keyword_suggestion(keyword: &KeywordSpec, library: &str, range: ReplaceRange) -> Suggestion {
    Suggestion {
        label: keyword.name.clone(),
        insert_text: keyword_snippet(keyword),
        documentation: keyword_documentation(keyword, library),
        replace_range: range,
        kind: SuggestionKind::Keyword,
        detail: Some(library.to_string()),
        is_snippet: true,
    }
}

/// Keyword name followed by one numbered tab stop per required argument.
pub fn keyword_snippet(keyword: &KeywordSpec) -> String {
    let mut snippet = escape_snippet_text(&keyword.name);
    for (index, parameter) in keyword.required_parameters().enumerate() {
        let _ = write!(
            snippet,
            "{}${{{}:{}}}",
            ARGUMENT_SEPARATOR,
            index + 1,
            escape_placeholder(&parameter.name)
        );
    }
    snippet
}

/// Markdown shown next to a keyword suggestion.
pub fn keyword_documentation(keyword: &KeywordSpec, library: &str) -> String {
    let mut doc = format!("*({}):*\n\n", library);

    if !keyword.parameters.is_empty() {
        doc.push_str("**Arguments:**\n");
        for parameter in &keyword.parameters {
            match &parameter.default_value {
                Some(default) => {
                    let _ = writeln!(doc, " - `{} = {}`", parameter.name, default);
                }
                None => {
                    let _ = writeln!(doc, " - `{}`", parameter.name);
                }
            }
        }
        doc.push('\n');
    }

    doc.push_str("**Documentation:**\n\n");
    doc.push_str(&keyword.documentation);
    doc
}

fn escape_snippet_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('$', "\\$")
}

fn escape_placeholder(text: &str) -> String {
    escape_snippet_text(text).replace('}', "\\}")
}
