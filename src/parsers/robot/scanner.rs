//! Document-level section scanning
//!
//! Completion needs two different views of the sections of a document:
//! which sections exist anywhere (so headers are not offered twice) and which
//! section the cursor is in (so keywords are only offered where they can be
//! called). The first is computed over the whole document, the second over
//! the lines up to and including the cursor line.

use std::collections::{BTreeSet, HashMap};

use super::sections::{SectionKind, classify};

/// Result of scanning a document for a cursor line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanResult {
    /// Every section kind declared anywhere in the document.
    pub existing_sections: BTreeSet<SectionKind>,
    /// Section of the last header at or before the cursor line.
    pub active_section: Option<SectionKind>,
}

/// Scans `lines` for section headers relative to a 0-based `cursor_line`.
///
/// A cursor line past the end of the document is treated as the last line.
pub fn scan<S: AsRef<str>>(lines: &[S], cursor_line: usize) -> ScanResult {
    let mut result = ScanResult::default();

    for (index, line) in lines.iter().enumerate() {
        if let Some(kind) = classify(line.as_ref()) {
            result.existing_sections.insert(kind);
            if index <= cursor_line {
                result.active_section = Some(kind);
            }
        }
    }

    result
}

/// Body lines of each declared section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable<'a> {
    bodies: HashMap<SectionKind, Vec<&'a str>>,
}

impl<'a> SectionTable<'a> {
    /// Non-empty lines following the header of `kind`, if declared.
    pub fn body(&self, kind: SectionKind) -> Option<&[&'a str]> {
        self.bodies.get(&kind).map(Vec::as_slice)
    }

    pub fn contains(&self, kind: SectionKind) -> bool {
        self.bodies.contains_key(&kind)
    }
}

/// Groups lines by the section they belong to.
///
/// Lines before the first header are dropped, as are empty lines. A header
/// declared a second time starts that section's body over.
pub fn group_sections<'a, S: AsRef<str>>(lines: &'a [S]) -> SectionTable<'a> {
    let mut table = SectionTable::default();
    let mut current = None;

    for line in lines {
        let line = line.as_ref();
        if let Some(kind) = classify(line) {
            table.bodies.insert(kind, Vec::new());
            current = Some(kind);
        } else if let Some(kind) = current {
            if !line.is_empty() {
                table.bodies.entry(kind).or_default().push(line);
            }
        }
    }

    table
}
