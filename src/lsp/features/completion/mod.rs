//! Code completion for Robot Framework documents
//!
//! This module provides:
//! - Context detection (active section, cursor cell, imported libraries)
//! - Section header and keyword suggestions built from the keyword catalog
//! - Conversion of suggestions into LSP completion items

pub mod context;
pub mod items;
pub mod suggestions;

pub use context::{CompletionContext, determine_context};
pub use items::to_completion_items;
pub use suggestions::{
    Suggestion, SuggestionKind, build_suggestions, keyword_documentation, keyword_snippet,
    provide_completions,
};
