//! Context detection for code completion
//!
//! Determines, for a cursor position, which section is active, which cell
//! the cursor is in and which libraries the document imports. Everything is
//! recomputed per request from the current text: imports can be added or
//! removed while typing, so nothing is cached between keystrokes.

use tracing::trace;

use crate::catalog::imported_libraries;
use crate::parsers::position_utils::{CursorPosition, line_prefix};
use crate::parsers::robot::{LexicalSlot, ScanResult, SectionKind, detect_slot, group_sections, scan};

/// Everything the suggestion builder needs to know about the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext<'a> {
    pub cursor: CursorPosition,
    /// Text of the cursor line up to the cursor.
    pub line_prefix: &'a str,
    pub slot: LexicalSlot,
    pub scan: ScanResult,
    /// Libraries imported in the Settings section, in declaration order.
    pub imported_libraries: Vec<String>,
}

impl CompletionContext<'_> {
    pub fn active_section(&self) -> Option<SectionKind> {
        self.scan.active_section
    }

    /// True when keyword suggestions apply: keyword cell of a step row in a
    /// section that calls keywords.
    pub fn accepts_keywords(&self) -> bool {
        matches!(self.slot, LexicalSlot::KeywordNameSlot { .. })
            && self.active_section().is_some_and(SectionKind::is_executable)
    }
}

/// Builds the completion context, or `None` if the cursor is outside the
/// document.
pub fn determine_context<'a>(lines: &[&'a str], cursor: CursorPosition) -> Option<CompletionContext<'a>> {
    let prefix = line_prefix(lines, cursor)?;
    let slot = detect_slot(prefix);
    let scan = scan(lines, cursor.line - 1);

    let sections = group_sections(lines);
    let imported = sections
        .body(SectionKind::Settings)
        .map(|body| imported_libraries(body))
        .unwrap_or_default();

    trace!(
        "Completion context at {}:{}: slot={:?} active={:?} imports={:?}",
        cursor.line, cursor.column, slot, scan.active_section, imported
    );

    Some(CompletionContext {
        cursor,
        line_prefix: prefix,
        slot,
        scan,
        imported_libraries: imported,
    })
}
