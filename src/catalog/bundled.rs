//! Libdoc data compiled into the binary
//!
//! Subsets of the BuiltIn, Collections, DateTime, String and XML standard
//! libraries, so completion works without any configured library directory.

use tracing::warn;

use super::KeywordCatalog;

const BUNDLED: [(&str, &str); 5] = [
    ("BuiltIn.json", include_str!("../../libraries/BuiltIn.json")),
    ("Collections.json", include_str!("../../libraries/Collections.json")),
    ("DateTime.json", include_str!("../../libraries/DateTime.json")),
    ("String.json", include_str!("../../libraries/String.json")),
    ("XML.json", include_str!("../../libraries/XML.json")),
];

/// Registers every bundled library into `catalog`.
///
/// Returns the number of libraries registered.
pub fn register_bundled(catalog: &mut KeywordCatalog) -> usize {
    let mut registered = 0;
    for (origin, json) in BUNDLED {
        match catalog.register_json(origin, json) {
            Ok(_) => registered += 1,
            Err(e) => warn!("Bundled library could not be loaded: {}", e),
        }
    }
    registered
}

impl KeywordCatalog {
    /// A catalog holding only the bundled libraries.
    pub fn bundled() -> Self {
        let mut catalog = Self::new();
        register_bundled(&mut catalog);
        catalog
    }
}
