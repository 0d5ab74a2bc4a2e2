//! Keyword catalog
//!
//! The catalog is the registry of library keywords offered by completion. It
//! is built once at startup from libdoc JSON (the bundled standard library
//! subsets plus any configured directories) and shared read-only afterwards.
//!
//! Loading is fault-isolated per library: a file that cannot be read or
//! parsed is reported and skipped, and everything else stays available.

pub mod bundled;
pub mod imports;
pub mod libdoc;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

pub use imports::{imported_libraries, parse_library_import};
pub use libdoc::LibraryDoc;

/// Name of the library every test file can use without importing it.
pub const BASE_LIBRARY: &str = "BuiltIn";

/// One keyword argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub required: bool,
    pub default_value: Option<String>,
}

/// Metadata of one library keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub documentation: String,
    pub library: String,
}

impl KeywordSpec {
    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|parameter| parameter.required)
    }
}

/// A library and its keywords in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub doc: String,
    pub version: Option<String>,
    pub keywords: Vec<KeywordSpec>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read library file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse library {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Registry of library keywords, keyed by library name.
#[derive(Debug, Clone, Default)]
pub struct KeywordCatalog {
    libraries: HashMap<String, Library>,
}

impl KeywordCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a library, replacing any earlier library with the same name.
    pub fn register(&mut self, library: Library) {
        debug!(
            "Registered library {} with {} keywords",
            library.name,
            library.keywords.len()
        );
        if let Some(previous) = self.libraries.insert(library.name.clone(), library) {
            debug!("Replaced previously registered library {}", previous.name);
        }
    }

    /// Parses libdoc JSON and registers the library it describes.
    ///
    /// `origin` names the source in error messages.
    pub fn register_json(&mut self, origin: &str, json: &str) -> Result<&Library, CatalogError> {
        let doc: LibraryDoc = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        let library = doc.into_library();
        let name = library.name.clone();
        self.register(library);
        Ok(&self.libraries[&name])
    }

    /// Loads one libdoc JSON file.
    pub fn load_file(&mut self, path: &Path) -> Result<&Library, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.register_json(&path.display().to_string(), &json)
    }

    /// Loads every `*.json` file in `dir`, in file name order.
    ///
    /// Files that fail to load are logged and returned; they never prevent
    /// the remaining files from loading.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<CatalogError>, CatalogError> {
        let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut failures = Vec::new();
        for path in paths {
            match self.load_file(&path) {
                Ok(library) => info!("LibDoc of \"{}\" loaded from {}", library.name, path.display()),
                Err(e) => {
                    warn!("Skipping library file: {}", e);
                    failures.push(e);
                }
            }
        }

        Ok(failures)
    }

    /// Loads every directory in `dirs`.
    ///
    /// An unreadable directory is logged and skipped like a broken file.
    /// Returns every failure encountered.
    pub fn load_dirs<P: AsRef<Path>>(&mut self, dirs: &[P]) -> Vec<CatalogError> {
        let mut failures = Vec::new();
        for dir in dirs {
            match self.load_dir(dir.as_ref()) {
                Ok(skipped) => failures.extend(skipped),
                Err(e) => {
                    warn!("Skipping library directory: {}", e);
                    failures.push(e);
                }
            }
        }
        failures
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.get(name)
    }

    /// Library names, sorted.
    pub fn library_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.libraries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Keywords available to a document importing `imported`.
    ///
    /// Keywords of each imported library come first, in import order and
    /// catalog order, followed by the base library. Imports missing from the
    /// catalog are skipped silently; names match case-sensitively.
    pub fn applicable_keywords<S: AsRef<str>>(&self, imported: &[S]) -> Vec<(&KeywordSpec, &str)> {
        let mut keywords = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for name in imported {
            let name = name.as_ref();
            if name == BASE_LIBRARY || seen.contains(&name) {
                continue;
            }
            seen.push(name);
            match self.libraries.get(name) {
                Some(library) => {
                    keywords.extend(library.keywords.iter().map(|k| (k, library.name.as_str())))
                }
                None => debug!("Imported library {} is not in the catalog", name),
            }
        }

        if let Some(base) = self.libraries.get(BASE_LIBRARY) {
            keywords.extend(base.keywords.iter().map(|k| (k, base.name.as_str())));
        }

        keywords
    }
}
