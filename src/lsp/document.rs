use ropey::Rope;

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent};

pub use crate::lsp::models::{LspDocument, LspDocumentState};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("version {received} is not newer than {current}")]
    StaleVersion { current: i32, received: i32 },

    #[error("position {line}:{character} is outside the document")]
    PositionOutOfRange { line: u32, character: u32 },
}

/// Converts an LSP position to a char index in the Rope.
///
/// `character` counts UTF-16 code units. A character past the end of its
/// line is clamped to the line end.
fn position_to_char_offset(position: &Position, text: &Rope) -> Result<usize, DocumentError> {
    let line = position.line as usize;
    if line > text.len_lines() || (line == text.len_lines() && position.character > 0) {
        return Err(DocumentError::PositionOutOfRange {
            line: position.line,
            character: position.character,
        });
    }
    if line == text.len_lines() {
        return Ok(text.len_chars());
    }

    let line_start = text.line_to_char(line);
    let line_text = text.line(line);
    let units = (position.character as usize).min(line_text.len_utf16_cu());
    Ok(line_start + line_text.utf16_cu_to_char(units))
}

impl LspDocumentState {
    pub fn new(text: &str, version: i32) -> Self {
        Self {
            text: Rope::from_str(text),
            version,
        }
    }

    /// Applies a list of content changes to the document state.
    /// Returns the updated text if the version is newer, otherwise an error.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<String, DocumentError> {
        if version <= self.version {
            return Err(DocumentError::StaleVersion {
                current: self.version,
                received: version,
            });
        }

        // Work on a copy so a bad range leaves the document untouched.
        let mut text = self.text.clone();
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_char_offset(&range.start, &text)?;
                let end = position_to_char_offset(&range.end, &text)?.max(start);
                text.remove(start..end);
                text.insert(start, &change.text);
            } else {
                text = Rope::from_str(&change.text);
            }
        }

        self.text = text;
        self.version = version;
        Ok(self.text.to_string())
    }
}

impl LspDocument {
    pub fn new(id: u32, text: &str, version: i32) -> Self {
        Self {
            id,
            state: tokio::sync::RwLock::new(LspDocumentState::new(text, version)),
        }
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Returns the number of lines in the document.
    pub async fn num_lines(&self) -> usize {
        self.state.read().await.text.len_lines()
    }

    /// Applies changes to the document, updating its text.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<String, DocumentError> {
        let mut state = self.state.write().await;
        state.apply(changes, version)
    }
}
