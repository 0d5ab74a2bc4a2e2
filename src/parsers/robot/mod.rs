//! Line-oriented analysis of Robot Framework test data
//!
//! Nothing here builds a syntax tree. Completion only needs to know which
//! section a line belongs to and which cell the cursor is in, and both can be
//! answered from plain text on every request.

pub mod cells;
pub mod scanner;
pub mod sections;

pub use cells::{LexicalSlot, detect_slot, is_at_keyword_slot, is_line_start};
pub use scanner::{ScanResult, SectionTable, group_sections, scan};
pub use sections::{SectionKind, SectionMarker, classify, section_markers};

/// Splits document text into lines, keeping a trailing empty line and
/// dropping `\r` from CRLF line endings.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}
