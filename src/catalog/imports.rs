//! Library imports declared in the Settings section

use once_cell::sync::Lazy;
use regex::Regex;

// `Library` setting name followed by a separator and the library cell.
static LIBRARY_SETTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Library(?: {2,}| ?\t ?)+(?P<name>.+?)(?: {2,}| ?\t ?| *$)")
        .expect("library import pattern is valid")
});

/// Library names imported by the given Settings body lines, in declaration
/// order and without duplicates.
pub fn imported_libraries<S: AsRef<str>>(settings_lines: &[S]) -> Vec<String> {
    let mut imports: Vec<String> = Vec::new();

    for line in settings_lines {
        let Some(name) = parse_library_import(line.as_ref()) else {
            continue;
        };
        if !imports.contains(&name) {
            imports.push(name);
        }
    }

    imports
}

/// Parses one `Library    Name` setting row into the catalog name.
///
/// File paths are reduced to their base name and a `.py` extension is
/// dropped, so `Library  ../libs/CustomLibrary.py` imports `CustomLibrary`.
pub fn parse_library_import(line: &str) -> Option<String> {
    let captures = LIBRARY_SETTING.captures(line)?;
    let cell = captures.name("name")?.as_str();

    let base = cell.rsplit(['/', '\\']).next().unwrap_or(cell);
    let name = base.strip_suffix(".py").unwrap_or(base);

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_library_import_variants() {
        assert_eq!(parse_library_import("Library    Collections"), Some("Collections".into()));
        assert_eq!(parse_library_import("library\tString"), Some("String".into()));
        assert_eq!(parse_library_import("LIBRARY  XML  use_lxml=True"), Some("XML".into()));
        assert_eq!(parse_library_import("Library  CustomLibrary.py"), Some("CustomLibrary".into()));
        assert_eq!(
            parse_library_import("Library  ${CURDIR}/../libs/InPageLibrary.py"),
            Some("InPageLibrary".into())
        );
        assert_eq!(
            parse_library_import("Library  SeleniumLibrary    WITH NAME    Browser"),
            Some("SeleniumLibrary".into())
        );
        assert_eq!(parse_library_import("Library  Collections  "), Some("Collections".into()));
    }

    #[test]
    fn test_non_import_rows() {
        assert_eq!(parse_library_import("Resource  keywords.resource"), None);
        assert_eq!(parse_library_import("Library"), None);
        assert_eq!(parse_library_import("Library Collections"), None);
        assert_eq!(parse_library_import("    Library  Collections"), None);
        assert_eq!(parse_library_import("Libraries  Collections"), None);
    }

    #[test]
    fn test_imported_libraries_keeps_order_and_dedupes() {
        let settings = [
            "Documentation  Demo",
            "Library  String",
            "Library  Collections",
            "Library  String",
        ];
        assert_eq!(imported_libraries(&settings), vec!["String", "Collections"]);
    }
}
