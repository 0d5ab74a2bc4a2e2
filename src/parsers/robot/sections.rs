//! Section header classification
//!
//! A Robot Framework file is split into sections ("tables") introduced by
//! header lines such as `*** Settings ***`. Matching tolerates asterisk
//! decoration, letter case and singular/plural forms, while insertion always
//! uses the canonical header text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// The five section kinds a test data file can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Settings,
    TestCases,
    Keywords,
    Comments,
    Variables,
}

impl SectionKind {
    /// All section kinds in the order they are offered as completions.
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Settings,
        SectionKind::TestCases,
        SectionKind::Keywords,
        SectionKind::Comments,
        SectionKind::Variables,
    ];

    /// The exact header text inserted by completion.
    pub fn canonical_header(self) -> &'static str {
        match self {
            SectionKind::Settings => "*** Settings ***",
            SectionKind::TestCases => "*** Test Cases ***",
            SectionKind::Keywords => "*** Keywords ***",
            SectionKind::Comments => "*** Comment ***",
            SectionKind::Variables => "*** Variables ***",
        }
    }

    /// Sections whose rows call keywords.
    pub fn is_executable(self) -> bool {
        matches!(self, SectionKind::TestCases | SectionKind::Keywords)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_header())
    }
}

/// Occurrence of a section header at a 0-based line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMarker {
    pub kind: SectionKind,
    pub line: usize,
}

// One alternation per kind; the named group that participates tells which
// kind matched. The tail accepts end of line or a column separator followed
// by anything (trailing cells on a header row are ignored).
static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:\* ?)+",
        r"(?:(?P<settings>settings?)",
        r"|(?P<test_cases>test cases?|tasks?)",
        r"|(?P<keywords>keywords?)",
        r"|(?P<comments>comments?)",
        r"|(?P<variables>variables?))",
        r" ?(?:\* ?)*(?:(?: {2,}| ?\t| ?$).*)?$",
    ))
    .expect("section header pattern is valid")
});

const GROUPS: [(&str, SectionKind); 5] = [
    ("settings", SectionKind::Settings),
    ("test_cases", SectionKind::TestCases),
    ("keywords", SectionKind::Keywords),
    ("comments", SectionKind::Comments),
    ("variables", SectionKind::Variables),
];

/// Classifies a single line as a section header.
///
/// Returns `None` for every line that is not a header; there is no error case.
pub fn classify(line: &str) -> Option<SectionKind> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let captures = HEADER_PATTERN.captures(line)?;
    GROUPS
        .iter()
        .find(|(group, _)| captures.name(group).is_some())
        .map(|(_, kind)| *kind)
}

/// Collects every header in `lines`, in document order.
pub fn section_markers<S: AsRef<str>>(lines: &[S]) -> Vec<SectionMarker> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(line, text)| {
            classify(text.as_ref()).map(|kind| SectionMarker { kind, line })
        })
        .collect()
}
