//! Cleanup of generated HTML reports before display

use once_cell::sync::Lazy;
use regex::Regex;

static EMPTY_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r##"(?is)<a href="#"></a>"##).expect("valid empty anchor regex"));

static SOURCE_TEMPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\{\{if source\}\}.*?</tr>.*?\{\{/if\}\}").expect("valid source template regex")
});

/// Removes the first empty anchor and the first unrendered
/// `{{if source}}` template row, which show up as noise when the report is
/// displayed outside its original directory.
pub fn sanitize_report(html: &str) -> String {
    let html = EMPTY_ANCHOR.replace(html, "");
    SOURCE_TEMPLATE.replace(&html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_removes_anchor_and_source_template() {
        let html = indoc! {r##"
            <body><a href="#"></a><table>
            {{if source}}<tr><td>Source:</td>
            <td>${source}</td></tr>{{/if}}
            <tr><td>Status</td></tr></table></body>
        "##};
        let cleaned = sanitize_report(html);
        assert!(!cleaned.contains(r##"<a href="#"></a>"##));
        assert!(!cleaned.contains("{{if source}}"));
        assert!(cleaned.contains("<tr><td>Status</td></tr>"));
    }

    #[test]
    fn test_plain_report_is_unchanged() {
        let html = "<html><body>PASS</body></html>";
        assert_eq!(sanitize_report(html), html);
    }
}
