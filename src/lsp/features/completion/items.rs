//! Conversion of suggestions into LSP completion items

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, InsertTextFormat,
    MarkupContent, MarkupKind, TextEdit,
};

use crate::parsers::position_utils::CursorPosition;

use super::suggestions::{Suggestion, SuggestionKind};

/// Converts suggestions into completion items. `line` is the text of the
/// cursor line, needed to express edit ranges in UTF-16 units.
///
/// `sort_text` keeps the builder's order (imported libraries before BuiltIn)
/// as the client's tie-breaker.
pub fn to_completion_items(suggestions: Vec<Suggestion>, cursor: CursorPosition, line: &str) -> Vec<CompletionItem> {
    suggestions
        .into_iter()
        .enumerate()
        .map(|(index, suggestion)| to_completion_item(suggestion, cursor, line, index))
        .collect()
}

fn to_completion_item(suggestion: Suggestion, cursor: CursorPosition, line: &str, index: usize) -> CompletionItem {
    let range = suggestion.replace_range.to_lsp_containing(cursor, line);

    let kind = match suggestion.kind {
        SuggestionKind::SectionHeader => CompletionItemKind::MODULE,
        SuggestionKind::Keyword => CompletionItemKind::FUNCTION,
    };

    let documentation = (!suggestion.documentation.is_empty()).then(|| {
        Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: suggestion.documentation,
        })
    });

    let insert_text_format = if suggestion.is_snippet {
        InsertTextFormat::SNIPPET
    } else {
        InsertTextFormat::PLAIN_TEXT
    };

    CompletionItem {
        label: suggestion.label.clone(),
        kind: Some(kind),
        detail: suggestion.detail,
        documentation,
        sort_text: Some(format!("{:05}", index)),
        filter_text: Some(suggestion.label),
        insert_text_format: Some(insert_text_format),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit::new(range, suggestion.insert_text))),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::position_utils::ReplaceRange;
    use tower_lsp::lsp_types::{Position, Range};

    fn suggestion(kind: SuggestionKind, range: ReplaceRange) -> Suggestion {
        Suggestion {
            label: "Log".to_string(),
            insert_text: "Log    ${1:message}".to_string(),
            documentation: "*(BuiltIn):*".to_string(),
            replace_range: range,
            kind,
            detail: Some("BuiltIn".to_string()),
            is_snippet: kind == SuggestionKind::Keyword,
        }
    }

    #[test]
    fn test_keyword_item_is_snippet_with_markdown() {
        let items = to_completion_items(
            vec![suggestion(SuggestionKind::Keyword, ReplaceRange::new(3, 5, 7))],
            CursorPosition::new(3, 7),
            "    Lo",
        );
        let item = &items[0];
        assert_eq!(item.kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::SNIPPET));
        assert_eq!(item.sort_text.as_deref(), Some("00000"));
        match &item.text_edit {
            Some(CompletionTextEdit::Edit(edit)) => {
                assert_eq!(edit.range, Range::new(Position::new(2, 4), Position::new(2, 6)));
                assert_eq!(edit.new_text, "Log    ${1:message}");
            }
            other => panic!("unexpected edit {:?}", other),
        }
        assert!(matches!(item.documentation, Some(Documentation::MarkupContent(_))));
    }

    #[test]
    fn test_header_item_range_reaches_cursor() {
        let mut header = suggestion(SuggestionKind::SectionHeader, ReplaceRange::new(1, 1, 1));
        header.documentation.clear();
        let items = to_completion_items(vec![header], CursorPosition::new(1, 4), "***");
        match &items[0].text_edit {
            Some(CompletionTextEdit::Edit(edit)) => {
                assert_eq!(edit.range, Range::new(Position::new(0, 0), Position::new(0, 3)));
            }
            other => panic!("unexpected edit {:?}", other),
        }
        assert!(items[0].documentation.is_none());
        assert_eq!(items[0].insert_text_format, Some(InsertTextFormat::PLAIN_TEXT));
    }
}
