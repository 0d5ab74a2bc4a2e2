//! Libdoc JSON model
//!
//! Catalog data is the JSON that `python -m robot.libdoc --format JSON`
//! produces. Only the fields completion needs are modelled; everything else
//! (types, tags, source locations) is ignored.

use serde::Deserialize;

use super::{KeywordSpec, Library, Parameter};

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDoc {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub keywords: Vec<KeywordDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordDoc {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ArgumentDoc>,
    #[serde(default)]
    pub doc: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentDoc {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    /// `POSITIONAL_OR_NAMED`, `VAR_POSITIONAL`, `VAR_NAMED`, ...
    #[serde(default)]
    pub kind: Option<String>,
    /// Display form such as `*args` or `level=INFO`.
    #[serde(default)]
    pub repr: Option<String>,
}

impl ArgumentDoc {
    /// Name as written in a call: `*args` and `**kwargs` keep their stars.
    fn display_name(&self) -> String {
        match self.kind.as_deref() {
            Some("VAR_POSITIONAL") => format!("*{}", self.name),
            Some("VAR_NAMED") => format!("**{}", self.name),
            _ => self.name.clone(),
        }
    }
}

impl LibraryDoc {
    pub fn into_library(self) -> Library {
        let name = self.name;
        let keywords = self
            .keywords
            .into_iter()
            .map(|keyword| KeywordSpec {
                name: keyword.name,
                parameters: keyword
                    .args
                    .iter()
                    .map(|arg| Parameter {
                        name: arg.display_name(),
                        required: arg.required,
                        default_value: arg.default_value.clone(),
                    })
                    .collect(),
                documentation: keyword.doc,
                library: name.clone(),
            })
            .collect();

        Library {
            name,
            doc: self.doc,
            version: self.version,
            keywords,
        }
    }
}
