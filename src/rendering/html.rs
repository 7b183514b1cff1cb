/// Sanitize an article's rich-text HTML body before it is stored.
///
/// Keeps ordinary formatting markup and `class` attributes used for
/// styling; removes scripts, event handlers and other active content.
pub fn sanitize_article_html(raw: &str) -> String {
    ammonia::Builder::default()
        .add_generic_attributes(&["class"])
        .clean(raw)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_formatting() {
        let result = sanitize_article_html("<h2>Rules</h2><p>Be <strong>kind</strong>.</p>");
        assert_eq!(result, "<h2>Rules</h2><p>Be <strong>kind</strong>.</p>");
    }

    #[test]
    fn test_keeps_class_attribute() {
        let result = sanitize_article_html(r#"<div class="prose max-w-none"><p>Hi</p></div>"#);
        assert!(result.contains(r#"class="prose max-w-none""#));
    }

    #[test]
    fn test_strips_script() {
        let result = sanitize_article_html("<p>ok</p><script>alert(1)</script>");
        assert!(!result.contains("script"));
        assert!(result.contains("<p>ok</p>"));
    }

    #[test]
    fn test_strips_event_handlers() {
        let result = sanitize_article_html(r#"<img src="a.png" onerror="alert(1)">"#);
        assert!(!result.contains("onerror"));
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(sanitize_article_html("just text"), "just text");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_article_html(""), "");
    }
}
